use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;

use crate::error::{CaError, Result};
use crate::record::{CertificateRecord, NewCertificateRecord};

/// Trait for issued-certificate storage backends (synchronous)
pub trait CertificateStore: Send + Sync {
    /// Store a new record, assigning its `id` and `created_at`.
    ///
    /// Fails with [`CaError::DuplicateSerial`] if the serial number is already stored.
    fn put(&self, record: NewCertificateRecord) -> Result<CertificateRecord>;

    /// Look a record up by its decimal serial number.
    fn get(&self, serial_number: &str) -> Result<Option<CertificateRecord>>;
}

/// In-memory certificate store
#[derive(Debug, Default)]
pub struct MemoryCertificateStore {
    records: RwLock<HashMap<String, CertificateRecord>>,
    next_id: AtomicU64,
}

impl MemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records. Fails like [`CertificateStore::get`] if the lock is
    /// poisoned.
    pub fn len(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|_| CaError::Storage("Failed to acquire read lock".to_string()))?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl CertificateStore for MemoryCertificateStore {
    fn put(&self, record: NewCertificateRecord) -> Result<CertificateRecord> {
        let mut records = self
            .records
            .write()
            .map_err(|_| CaError::Storage("Failed to acquire write lock".to_string()))?;

        if records.contains_key(&record.serial_number) {
            return Err(CaError::DuplicateSerial(record.serial_number));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stored = CertificateRecord::from_new(record, id, OffsetDateTime::now_utc());
        records.insert(stored.serial_number.clone(), stored.clone());
        Ok(stored)
    }

    fn get(&self, serial_number: &str) -> Result<Option<CertificateRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| CaError::Storage("Failed to acquire read lock".to_string()))?;

        Ok(records.get(serial_number).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::Certificate;
    use crate::cert::params::{DistinguishedName, Validity};
    use crate::key::KeyPair;
    use crate::record::{CertificateStatus, IssuedCertificate};

    fn new_record(serial: u64) -> NewCertificateRecord {
        let key = KeyPair::generate_rsa(1024).unwrap();
        let subject = DistinguishedName::builder()
            .common_name(format!("host-{serial}.example.com"))
            .build();
        let cert = Certificate::new_self_signed(&subject, &key, Validity::for_days(1), serial)
            .unwrap();
        let issued = IssuedCertificate::from_certificate(&cert).unwrap();
        NewCertificateRecord::new(&issued, CertificateStatus::Active)
    }

    #[test]
    fn put_assigns_increasing_ids() {
        let store = MemoryCertificateStore::new();
        assert!(store.is_empty().unwrap());
        let first = store.put(new_record(10)).unwrap();
        let second = store.put(new_record(11)).unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len().unwrap(), 2);

        assert_eq!(store.get("10").unwrap(), Some(first));
        assert_eq!(store.get("12").unwrap(), None);
    }

    #[test]
    fn duplicate_serial_is_rejected() {
        let store = MemoryCertificateStore::new();
        let record = new_record(5);
        store.put(record.clone()).unwrap();
        assert_eq!(
            store.put(record),
            Err(CaError::DuplicateSerial("5".to_string()))
        );
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let store = std::sync::Arc::new(MemoryCertificateStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.records.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(store.len(), Err(CaError::Storage(_))));
        assert!(store.is_empty().is_err());
        assert!(matches!(store.get("1"), Err(CaError::Storage(_))));
    }
}
