use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest.
pub const FINGERPRINT_LEN: usize = 64;

/// Compute the content fingerprint of `content`: SHA-256, lowercase hex.
pub fn fingerprint(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Exact comparison of two fingerprints. No case folding.
pub fn hashes_match(a: &str, b: &str) -> bool {
    a == b
}

pub fn is_fingerprint(candidate: &str) -> bool {
    candidate.len() == FINGERPRINT_LEN && candidate.chars().all(|c| c.is_ascii_hexdigit())
}
