//! SHA-256 checksums for stored files (proposals, final reports,
//! deliverables).

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Whether `data` hashes to `expected` (hex, case-insensitive).
pub fn matches_digest(data: &[u8], expected: &str) -> bool {
    sha256_hex(data).eq_ignore_ascii_case(expected.trim())
}
