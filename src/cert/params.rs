use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Any, BmpString, Ia5StringRef, PrintableStringRef, SetOfVec};
use der::{Tag, Tagged};
use serde::{Deserialize, Serialize};
use time::Duration;
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::CaError;

/// PKCS#9 `emailAddress`, still common in CSR subjects.
pub const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// Distinguished name attributes, one field per attribute type.
///
/// This struct represents the subject or issuer name in a certificate, and the subject
/// columns of a persisted certificate record.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
/// * `email` - The PKCS#9 e-mail address.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
    pub email: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 `Name`.
    ///
    /// Attributes are emitted in the order C, ST, L, O, OU, CN, emailAddress, each in its
    /// own RDN. Absent optional attributes are left out.
    pub fn as_x509_name(&self) -> Result<Name, CaError> {
        use const_oid::db::rfc4519;

        let mut rdns = Vec::new();
        if let Some(country) = &self.country {
            rdns.push(single_rdn(rfc4519::C, Tag::PrintableString, country)?);
        }
        for (oid, value) in [
            (rfc4519::ST, &self.state),
            (rfc4519::L, &self.locality),
            (rfc4519::O, &self.organization),
            (rfc4519::OU, &self.organization_unit),
            (rfc4519::CN, &Some(self.common_name.clone())),
        ] {
            if let Some(value) = value {
                rdns.push(single_rdn(oid, Tag::Utf8String, value)?);
            }
        }
        if let Some(email) = &self.email {
            rdns.push(single_rdn(EMAIL_ADDRESS, Tag::Ia5String, email)?);
        }
        Ok(RdnSequence(rdns))
    }

    /// Creates a `DistinguishedName` from an X.509 `Name`.
    ///
    /// Every supported attribute is picked up individually. When an attribute type repeats,
    /// the last occurrence wins; unknown attribute types and undecodable string types are
    /// skipped.
    pub fn from_x509_name(x509dn: &Name) -> Self {
        use const_oid::db::rfc4519;

        let mut dn = DistinguishedName::default();
        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = attribute_string(&attr.value) else {
                    continue;
                };
                match attr.oid {
                    rfc4519::CN => dn.common_name = value,
                    rfc4519::C => dn.country = Some(value),
                    rfc4519::ST => dn.state = Some(value),
                    rfc4519::L => dn.locality = Some(value),
                    rfc4519::O => dn.organization = Some(value),
                    rfc4519::OU => dn.organization_unit = Some(value),
                    EMAIL_ADDRESS => dn.email = Some(value),
                    _ => {}
                }
            }
        }
        dn
    }
}

fn single_rdn(
    oid: ObjectIdentifier,
    tag: Tag,
    value: &str,
) -> Result<RelativeDistinguishedName, CaError> {
    let invalid = |e: der::Error| CaError::InvalidInput(format!("{oid}: {e}"));
    match tag {
        Tag::PrintableString => {
            PrintableStringRef::new(value).map_err(invalid)?;
        }
        Tag::Ia5String => {
            Ia5StringRef::new(value).map_err(invalid)?;
        }
        _ => {}
    }
    let value = Any::new(tag, value.as_bytes()).map_err(invalid)?;
    let set = SetOfVec::try_from(vec![AttributeTypeAndValue { oid, value }])
        .map_err(|e| CaError::EncodingError(e.to_string()))?;
    Ok(RelativeDistinguishedName(set))
}

/// Decodes the directory string types seen in practice.
fn attribute_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {
            std::str::from_utf8(value.value()).ok().map(str::to_owned)
        }
        // T.61 in the wild is almost always Latin-1.
        Tag::TeletexString => Some(value.value().iter().map(|&b| char::from(b)).collect()),
        Tag::BmpString => BmpString::from_ucs2(value.value())
            .ok()
            .map(|s| s.to_string()),
        _ => None,
    }
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    ///
    /// The start is truncated to whole seconds, the precision X.509 times are encoded
    /// with, so the decoded window is exactly `days` long.
    pub fn for_days(days: i64) -> Self {
        Self::starting_at(OffsetDateTime::now_utc(), days)
    }

    /// Creates a validity period of `days` days starting at `start` (truncated to seconds).
    pub fn starting_at(start: OffsetDateTime, days: i64) -> Self {
        let not_before = start - Duration::nanoseconds(i64::from(start.nanosecond()));
        Self {
            not_before,
            not_after: not_before + Duration::days(days),
        }
    }

    /// Whether `at` lies within `[not_before, not_after]`, both ends inclusive.
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: E,
        critical: bool,
    ) -> Result<Self, CaError> {
        Ok(Self {
            oid: E::OID,
            critical,
            value: extension.to_x509_extension_value()?,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CaError> {
        E::from_x509_extension_value(&self.value)
    }

    pub fn from_x509(ext: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: ext.extn_id,
            critical: ext.critical,
            value: ext.extn_value.as_bytes().to_vec(),
        }
    }

    pub fn to_x509(&self) -> Result<x509_cert::ext::Extension, CaError> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: der::asn1::OctetString::new(self.value.clone())?,
        })
    }
}
