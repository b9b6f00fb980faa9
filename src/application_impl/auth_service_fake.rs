use crate::application_port::*;
use crate::domain_model::*;
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

// Minimal fake for running the app without MySQL or Redis.
// Tokens are predictable strings; nothing is stored or revoked.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn login(&self, identity: LoginIdentity) -> Result<LoginResult, AuthError> {
        let user_id = get_fake_id(identity);
        Ok(LoginResult {
            user_id,
            refresh: get_fake_refresh(user_id),
        })
    }

    async fn create_access_token(
        &self,
        claimed_user: UserId,
        refresh_token: &str,
    ) -> Result<IssuedToken<AccessToken>, AuthError> {
        let user_id = parse_fake(refresh_token, "fake-refresh-token:")?;
        if user_id != claimed_user {
            return Err(AuthError::IdentityMismatch);
        }
        Ok(get_fake_access(user_id))
    }

    async fn refresh_token(
        &self,
        claimed_user: UserId,
        refresh_token: &str,
    ) -> Result<AuthTokens, AuthError> {
        let access = self.create_access_token(claimed_user, refresh_token).await?;
        Ok(AuthTokens {
            access,
            refresh: get_fake_refresh(claimed_user),
        })
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        parse_fake(token, "fake-access-token:")
    }

    async fn verify_api_key(&self, key: &str) -> Result<ApiKeyRecord, AuthError> {
        if key.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(ApiKeyRecord {
            id: 0,
            key_hash: hash_api_key(key),
            purpose: "fake".to_string(),
            created_at: Utc::now(),
        })
    }
}

fn get_fake_id(identity: LoginIdentity) -> UserId {
    let name = format!("{}:{}", identity.school_code, identity.tsa_id);
    UserId(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes()))
}

fn parse_fake(token: &str, prefix: &str) -> Result<UserId, AuthError> {
    token
        .strip_prefix(prefix)
        .and_then(|id| id.parse::<UserId>().ok())
        .ok_or(AuthError::MalformedToken)
}

fn get_fake_access(user_id: UserId) -> IssuedToken<AccessToken> {
    IssuedToken {
        token: AccessToken(format!("fake-access-token:{}", user_id)),
        expires_at: Utc::now() + Duration::minutes(15),
    }
}

fn get_fake_refresh(user_id: UserId) -> IssuedToken<RefreshToken> {
    IssuedToken {
        token: RefreshToken(format!("fake-refresh-token:{}", user_id)),
        expires_at: Utc::now() + Duration::hours(24),
    }
}
