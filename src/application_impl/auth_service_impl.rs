use super::CredentialPolicy;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    api_key_repo: Arc<dyn ApiKeyRepo>,
    issuer: Arc<dyn CredentialIssuer>,
    validator: Arc<dyn CredentialValidator>,
    policy: CredentialPolicy,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        api_key_repo: Arc<dyn ApiKeyRepo>,
        issuer: Arc<dyn CredentialIssuer>,
        validator: Arc<dyn CredentialValidator>,
        policy: CredentialPolicy,
    ) -> Self {
        Self {
            user_repo,
            api_key_repo,
            issuer,
            validator,
            policy,
        }
    }

    /// Validate the refresh token and make sure it belongs to the user the
    /// client claims to be.
    async fn verify_refresh_for(
        &self,
        claimed_user: UserId,
        refresh_token: &str,
    ) -> Result<VerifiedRefresh, AuthError> {
        let verified = self.validator.validate_refresh_token(refresh_token).await?;
        if verified.user_id != claimed_user {
            debug!(%claimed_user, actual = %verified.user_id, "refresh token presented for another user");
            return Err(AuthError::IdentityMismatch);
        }
        Ok(verified)
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, identity: LoginIdentity) -> Result<LoginResult, AuthError> {
        let user_id = self
            .user_repo
            .find_by_identity(identity)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let refresh = self.issuer.issue_refresh_credential(user_id).await?;
        info!(%user_id, "user logged in");

        Ok(LoginResult { user_id, refresh })
    }

    async fn create_access_token(
        &self,
        claimed_user: UserId,
        refresh_token: &str,
    ) -> Result<IssuedToken<AccessToken>, AuthError> {
        let verified = self.verify_refresh_for(claimed_user, refresh_token).await?;

        let access = self
            .issuer
            .issue_access_credential(verified.user_id, self.policy.access_ttl)
            .await?;
        info!(user_id = %verified.user_id, "access token issued");
        Ok(access)
    }

    async fn refresh_token(
        &self,
        claimed_user: UserId,
        refresh_token: &str,
    ) -> Result<AuthTokens, AuthError> {
        let verified = self.verify_refresh_for(claimed_user, refresh_token).await?;
        let user_id = verified.user_id;

        let refresh = self.issuer.issue_refresh_credential(user_id).await?;
        let access = self
            .issuer
            .issue_access_credential(user_id, self.policy.access_ttl)
            .await?;

        // Retire only after both replacements exist. Of two concurrent
        // rotations only one wins the compare-and-delete; the loser's new
        // credentials are never handed out and lapse on their own.
        if self.policy.rotation == RotationPolicy::InvalidateOnRotate {
            self.issuer.retire_refresh_credential(&verified).await?;
        }
        info!(%user_id, rotation = ?self.policy.rotation, "refresh credential rotated");

        Ok(AuthTokens { access, refresh })
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        self.validator.validate_access_token(token).await
    }

    async fn verify_api_key(&self, key: &str) -> Result<ApiKeyRecord, AuthError> {
        let record = self
            .api_key_repo
            .get_by_hash(&hash_api_key(key))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(record)
    }
}
