//! Content fingerprints for duplicate detection

use sha2::{Digest, Sha256};

/// Hex characters kept from the digest
pub const FINGERPRINT_LEN: usize = 16;

/// Short hash of the code text
pub fn fingerprint(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(FINGERPRINT_LEN);
    hex
}
