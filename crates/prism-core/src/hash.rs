//! Content hashing for analysis caching and record integrity.

use blake3::Hasher;

/// BLAKE3 hex digest of an in-memory byte buffer.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize().to_hex().to_string()
}
