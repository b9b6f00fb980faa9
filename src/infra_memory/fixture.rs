use super::*;
use crate::application_impl::*;
use crate::domain_model::*;
use chrono::Utc;
use std::sync::Arc;

pub const TEST_API_KEY: &str = "dashboard-key";

/// A fully wired `RealAuthService` over in-memory stores and a manual clock.
pub struct MemoryAuthFixture {
    pub auth: Arc<RealAuthService>,
    pub users: Arc<MemoryUserRepo>,
    pub clock: Arc<ManualClock>,
    pub secrets: Arc<FlakyStore>,
    pub sessions: Arc<FlakyStore>,
}

impl MemoryAuthFixture {
    pub fn new(rotation: RotationPolicy) -> Self {
        let policy = CredentialPolicy {
            rotation,
            ..CredentialPolicy::default()
        };
        let codec = Arc::new(JwtHs512Codec::new(JwtConfig {
            issuer: "nctsa.auth".to_string(),
            audience: "nctsa-app".to_string(),
            access_signing_key: b"short-lived".to_vec(),
            refresh_signing_key: b"long-lived".to_vec(),
        }));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let secrets = Arc::new(FlakyStore::new(Arc::new(MemorySecretStore::new())));
        let sessions = Arc::new(FlakyStore::new(Arc::new(MemorySessionStore::new(
            clock.clone(),
        ))));
        let credentials = Arc::new(RealCredentialService::new(
            codec,
            secrets.clone(),
            sessions.clone(),
            clock.clone(),
            policy,
        ));
        let api_keys = Arc::new(MemoryApiKeyRepo::new());
        api_keys.add(TEST_API_KEY, "management dashboard");
        let users = Arc::new(MemoryUserRepo::new());
        let auth = Arc::new(RealAuthService::new(
            users.clone(),
            api_keys,
            credentials.clone(),
            credentials,
            policy,
        ));
        MemoryAuthFixture {
            auth,
            users,
            clock,
            secrets,
            sessions,
        }
    }
}
