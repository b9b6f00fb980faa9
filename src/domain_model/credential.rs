use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-generated random value embedded in a token and stored independently.
/// It is the revocation handle for the token that carries it.
#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(pub String);

impl Secret {
    pub fn generate() -> Self {
        Secret(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Secrets end up next to user ids in log lines; never print them.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct RefreshCredentialId(pub i64);

impl fmt::Display for RefreshCredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable record backing one refresh token. Never updated after insert.
#[derive(Debug, Clone)]
pub struct RefreshCredentialRecord {
    pub id: RefreshCredentialId,
    pub user_id: UserId,
    pub secret: Secret,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub user_id: UserId,
    pub secret: Secret,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub user_id: UserId,
    pub credential_id: RefreshCredentialId,
    pub secret: Secret,
    pub expires_at: DateTime<Utc>,
}

/// What happens to the presented refresh record when it is rotated.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// The old record stays usable until its own expiry. A stolen refresh token
    /// keeps working after the legitimate client rotated it.
    #[default]
    AllowOverlap,
    /// The old record is removed before the new one is issued, so each refresh
    /// token can be rotated exactly once.
    InvalidateOnRotate,
}
