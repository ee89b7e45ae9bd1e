// hasher.rs — SHA-256 hashing utilities.
//
// All hashes in the governance core are SHA-256, hex-encoded. The audit
// trail hash carries a `sha256:` prefix so consumers can verify which
// algorithm produced it.

use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a UTF-8 string, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

/// Hash a UTF-8 string, returning the `sha256:<hex>` tagged form used for
/// audit trail and checkpoint integrity hashes.
pub fn hash_str_prefixed(s: &str) -> String {
    format!("sha256:{}", hash_str(s))
}
