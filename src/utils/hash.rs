use sha2::{Digest, Sha256};

/// Generate a hex SHA-256 digest for a canonical key string
pub fn hash_key(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}
