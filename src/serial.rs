//! Random certificate serial numbers.
//!
//! Serials are drawn from a 63-bit space. Uniqueness is not tracked here; with 2^63
//! possible values a collision is left to the store's uniqueness check to surface.

use rand::RngCore;

/// Produces cryptographically random, positive, 63-bit serial numbers.
///
/// Each call draws from `rand`'s thread-local CSPRNG, so one generator can be shared
/// freely between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialNumberGenerator;

impl SerialNumberGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn next(&self) -> u64 {
        let mut bytes = [0u8; 8];
        rand::rng().fill_bytes(&mut bytes);
        serial_from_bytes(bytes)
    }
}

/// Clears the sign bit, reads big-endian, and maps zero to one.
pub fn serial_from_bytes(mut bytes: [u8; 8]) -> u64 {
    bytes[0] &= 0x7f;
    match u64::from_be_bytes(bytes) {
        0 => 1,
        serial => serial,
    }
}
