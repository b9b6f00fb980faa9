use super::{AccessToken, AuthError, IssuedToken, RefreshToken};
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Signs and verifies the two token kinds. Verification checks signature,
/// algorithm, issuer and audience only; expiry is left to the caller so that it
/// can be judged against an injectable clock.
pub trait TokenCodec: Send + Sync {
    fn sign_access(&self, claims: &AccessClaims) -> Result<AccessToken, AuthError>;
    fn sign_refresh(&self, claims: &RefreshClaims) -> Result<RefreshToken, AuthError>;
    fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError>;
    fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError>;
}

/// A refresh token that passed every check, with the handle needed to retire
/// its backing record.
#[derive(Debug, Clone)]
pub struct VerifiedRefresh {
    pub user_id: UserId,
    pub credential_id: RefreshCredentialId,
    pub secret: Secret,
    pub expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue_refresh_credential(
        &self,
        user_id: UserId,
    ) -> Result<IssuedToken<RefreshToken>, AuthError>;

    /// The session entry is written with `ttl` and the token expires after the
    /// same `ttl`, so the entry never outlives the token by more than a second.
    async fn issue_access_credential(
        &self,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<IssuedToken<AccessToken>, AuthError>;

    /// Remove the backing record of `verified` if it still holds the same
    /// secret. Fails with `UnknownSecret` when somebody else got there first.
    async fn retire_refresh_credential(&self, verified: &VerifiedRefresh)
    -> Result<(), AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate_access_token(&self, token: &str) -> Result<UserId, AuthError>;
    async fn validate_refresh_token(&self, token: &str) -> Result<VerifiedRefresh, AuthError>;
}
