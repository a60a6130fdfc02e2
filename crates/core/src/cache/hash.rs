//! Deterministic cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a normalized URL.
///
/// The same normalized URL always hashes to the same key; callers are
/// expected to normalize before hashing so that equivalent URL spellings
/// collapse onto one entry.
pub fn compute_url_hash(normalized_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_url.as_bytes());
    hex::encode(hasher.finalize())
}
