use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

const ACCESS_KEY_VAR: &str = "JWT_SHORT_LIVED_SECRET";
const REFRESH_KEY_VAR: &str = "JWT_REFRESH_SECRET";

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub fn new(auth_service: Arc<dyn AuthService>) -> Self {
        Self {
            auth_service,
            pool: None,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let server = match settings.auth.backend.as_str() {
            "fake" => {
                warn!("using fake auth backend, tokens are not verified");
                Self::new(Arc::new(FakeAuthService::new()))
            }
            "real" => Self::try_new_real(settings).await?,
            other => return Err(anyhow!("Unknown auth backend: {}", other)),
        };

        info!("server started");
        Ok(server)
    }

    async fn try_new_real(settings: &Settings) -> anyhow::Result<Self> {
        let redis_client = redis::Client::open(settings.store.redis_dsn.as_str())?;
        let redis_manager = redis_client.get_connection_manager().await?;

        let pool = Pool::<MySql>::connect(&settings.store.mysql_dsn).await?;

        let policy = CredentialPolicy {
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
            rotation: settings.auth.rotation,
        };
        info!(?policy, "credential policy");

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs512Codec::new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            audience: settings.auth.audience.clone(),
            access_signing_key: signing_key(ACCESS_KEY_VAR)?,
            refresh_signing_key: signing_key(REFRESH_KEY_VAR)?,
        }));

        // The key prefix must be the same on every instance, otherwise a token
        // issued by one instance is unknown to the others.
        let session_store: Arc<dyn CredentialBackingStore> = Arc::new(RedisSessionStore::new(
            redis_manager,
            settings.auth.session_key_prefix.clone(),
        ));
        let secret_store: Arc<dyn CredentialBackingStore> =
            Arc::new(MySqlSecretStore::new(pool.clone()));
        let user_repo: Arc<dyn UserRepo> = Arc::new(MySqlUserRepo::new(pool.clone()));
        let api_key_repo: Arc<dyn ApiKeyRepo> = Arc::new(MySqlApiKeyRepo::new(pool.clone()));

        let credentials = Arc::new(RealCredentialService::new(
            token_codec,
            secret_store,
            session_store,
            Arc::new(SystemClock),
            policy,
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo,
            api_key_repo,
            credentials.clone(),
            credentials,
            policy,
        ));

        Ok(Self {
            auth_service,
            pool: Some(pool),
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Read a signing key from the environment. Debug builds fall back to a
/// fixed development key; release builds refuse to start without one.
fn signing_key(var: &str) -> anyhow::Result<Vec<u8>> {
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(key.into_bytes()),
        _ if cfg!(debug_assertions) => {
            warn!("{} not set, using development key", var);
            Ok(format!("nctsa-dev-{}", var.to_lowercase()).into_bytes())
        }
        _ => Err(anyhow!("{} must be set", var)),
    }
}
