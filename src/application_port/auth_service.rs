use crate::domain_model::{ApiKeyRecord, LoginIdentity, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("malformed token")]
    MalformedToken,
    #[error("token expired")]
    Expired,
    #[error("token secret unknown")]
    UnknownSecret,
    #[error("token identity mismatch")]
    IdentityMismatch,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("store write error: {0}")]
    StoreWrite(String),
    #[error("store read error: {0}")]
    StoreRead(String),
    #[error("signing error: {0}")]
    Signing(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// True for every failure that must be reported to the client as a plain
    /// "not authenticated", whatever check actually failed.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken
                | AuthError::Expired
                | AuthError::UnknownSecret
                | AuthError::IdentityMismatch
                | AuthError::InvalidCredentials
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

/// A freshly minted token together with the expiry embedded in its claims.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken<T> {
    pub token: T,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access: IssuedToken<AccessToken>,
    pub refresh: IssuedToken<RefreshToken>,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub refresh: IssuedToken<RefreshToken>,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange a conference identity for a refresh credential.
    async fn login(&self, identity: LoginIdentity) -> Result<LoginResult, AuthError>;

    /// Exchange a refresh token for a new access token. The refresh record is
    /// left untouched.
    async fn create_access_token(
        &self,
        claimed_user: UserId,
        refresh_token: &str,
    ) -> Result<IssuedToken<AccessToken>, AuthError>;

    /// Rotate a refresh token: returns a new refresh token and a new access
    /// token. Whether the presented token stays usable depends on the
    /// configured `RotationPolicy`.
    async fn refresh_token(
        &self,
        claimed_user: UserId,
        refresh_token: &str,
    ) -> Result<AuthTokens, AuthError>;

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;

    async fn verify_api_key(&self, key: &str) -> Result<ApiKeyRecord, AuthError>;
}
