use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Lifetimes and rotation behaviour of the credential pair.
#[derive(Debug, Clone, Copy)]
pub struct CredentialPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub rotation: RotationPolicy,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        CredentialPolicy {
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(24 * 60 * 60),
            rotation: RotationPolicy::AllowOverlap,
        }
    }
}

/// Issues and validates both credential kinds. Every token is bound twice: by
/// its signature and by a live entry in the backing store of its kind.
pub struct RealCredentialService {
    codec: Arc<dyn TokenCodec>,
    secret_store: Arc<dyn CredentialBackingStore>,
    session_store: Arc<dyn CredentialBackingStore>,
    clock: Arc<dyn Clock>,
    refresh_ttl: Duration,
}

impl RealCredentialService {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        secret_store: Arc<dyn CredentialBackingStore>,
        session_store: Arc<dyn CredentialBackingStore>,
        clock: Arc<dyn Clock>,
        policy: CredentialPolicy,
    ) -> Self {
        Self {
            codec,
            secret_store,
            session_store,
            clock,
            refresh_ttl: policy.refresh_ttl,
        }
    }

    /// Expiry truncated to whole seconds, the precision the token carries.
    fn expiry(&self, ttl: Duration) -> Result<DateTime<Utc>, AuthError> {
        let ttl = i64::try_from(ttl.as_secs())
            .map_err(|_| AuthError::InternalError(format!("ttl out of range: {:?}", ttl)))?;
        let exp = self
            .clock
            .now()
            .timestamp()
            .checked_add(ttl)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| AuthError::InternalError("expiry out of range".to_string()))?;
        Ok(exp)
    }

    fn ensure_unexpired(&self, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
        if self.clock.now() >= expires_at {
            return Err(AuthError::Expired);
        }
        Ok(())
    }

    /// Cross-check the claims against what the store holds for them.
    fn check_binding(
        entry: Option<BackingEntry>,
        user_id: UserId,
        secret: &Secret,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let entry = entry.ok_or(AuthError::UnknownSecret)?;
        if entry.secret != *secret {
            return Err(AuthError::UnknownSecret);
        }
        if let Some(stored) = entry.expires_at {
            if stored.timestamp() != expires_at.timestamp() {
                return Err(AuthError::UnknownSecret);
            }
        }
        if entry.user_id != user_id {
            return Err(AuthError::IdentityMismatch);
        }
        Ok(())
    }

    async fn validate_access(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = self.codec.verify_access(token)?;
        self.ensure_unexpired(claims.expires_at)?;

        let handle = BackingHandle::Secret(claims.secret.clone());
        let entry = self.session_store.get(&handle).await?;
        Self::check_binding(entry, claims.user_id, &claims.secret, claims.expires_at)?;

        Ok(claims.user_id)
    }

    async fn validate_refresh(&self, token: &str) -> Result<VerifiedRefresh, AuthError> {
        let claims = self.codec.verify_refresh(token)?;
        self.ensure_unexpired(claims.expires_at)?;

        let handle = BackingHandle::Record(claims.credential_id);
        let entry = self.secret_store.get(&handle).await?;
        Self::check_binding(entry, claims.user_id, &claims.secret, claims.expires_at)?;

        Ok(VerifiedRefresh {
            user_id: claims.user_id,
            credential_id: claims.credential_id,
            secret: claims.secret,
            expires_at: claims.expires_at,
        })
    }
}

#[async_trait::async_trait]
impl CredentialIssuer for RealCredentialService {
    async fn issue_refresh_credential(
        &self,
        user_id: UserId,
    ) -> Result<IssuedToken<RefreshToken>, AuthError> {
        let secret = Secret::generate();
        let expires_at = self.expiry(self.refresh_ttl)?;

        let credential_id = match self.secret_store.put(user_id, &secret, expires_at).await? {
            BackingHandle::Record(id) => id,
            BackingHandle::Secret(_) => {
                return Err(AuthError::StoreWrite(
                    "secret store returned a keyed handle".to_string(),
                ));
            }
        };

        let token = self.codec.sign_refresh(&RefreshClaims {
            user_id,
            credential_id,
            secret,
            expires_at,
        })?;
        debug!(%credential_id, %expires_at, "refresh credential stored");
        info!(%user_id, "refresh credential issued");

        Ok(IssuedToken { token, expires_at })
    }

    async fn issue_access_credential(
        &self,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<IssuedToken<AccessToken>, AuthError> {
        let secret = Secret::generate();
        let expires_at = self.expiry(ttl)?;

        self.session_store.put(user_id, &secret, expires_at).await?;

        let token = self.codec.sign_access(&AccessClaims {
            user_id,
            secret,
            expires_at,
        })?;
        debug!(%expires_at, "access credential stored");
        info!(%user_id, "access credential issued");

        Ok(IssuedToken { token, expires_at })
    }

    async fn retire_refresh_credential(
        &self,
        verified: &VerifiedRefresh,
    ) -> Result<(), AuthError> {
        let handle = BackingHandle::Record(verified.credential_id);
        if !self.secret_store.revoke(&handle, &verified.secret).await? {
            debug!(credential_id = %verified.credential_id, "refresh credential already retired");
            return Err(AuthError::UnknownSecret);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CredentialValidator for RealCredentialService {
    async fn validate_access_token(&self, token: &str) -> Result<UserId, AuthError> {
        self.validate_access(token).await.inspect_err(|e| {
            debug!(reason = %e, "access token rejected");
        })
    }

    async fn validate_refresh_token(&self, token: &str) -> Result<VerifiedRefresh, AuthError> {
        self.validate_refresh(token).await.inspect_err(|e| {
            debug!(reason = %e, "refresh token rejected");
        })
    }
}
