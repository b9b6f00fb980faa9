use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Admin API key as stored: only the SHA-256 digest of the key is kept.
#[derive(Debug, Clone)]
pub struct ApiKeyRecord {
    pub id: i64,
    pub key_hash: String,
    pub purpose: String,
    pub created_at: DateTime<Utc>,
}

pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}
