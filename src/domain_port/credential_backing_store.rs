use crate::application_port::AuthError;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// How a stored secret is found again. Durable stores hand out record ids,
/// keyed stores are addressed by the secret itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackingHandle {
    Record(RefreshCredentialId),
    Secret(Secret),
}

#[derive(Debug, Clone)]
pub struct BackingEntry {
    pub user_id: UserId,
    pub secret: Secret,
    /// `None` when expiry is enforced by the store itself (key TTL).
    pub expires_at: Option<DateTime<Utc>>,
}

/// Storage behind one credential kind. Refresh credentials live in a durable
/// indexed store, access credentials in an ephemeral keyed store; the issuer
/// and validator only ever talk to this trait.
#[async_trait::async_trait]
pub trait CredentialBackingStore: Send + Sync {
    async fn put(
        &self,
        user_id: UserId,
        secret: &Secret,
        expires_at: DateTime<Utc>,
    ) -> Result<BackingHandle, AuthError>;

    async fn get(&self, handle: &BackingHandle) -> Result<Option<BackingEntry>, AuthError>;

    /// Remove the entry if it still holds `secret`. Returns whether anything
    /// was removed.
    async fn revoke(&self, handle: &BackingHandle, secret: &Secret) -> Result<bool, AuthError>;
}
