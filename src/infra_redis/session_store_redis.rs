use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, FromRedisValue, RedisError, RedisResult, RedisWrite, SetExpiry, SetOptions,
    ToRedisArgs, Value,
};

/// Access-token session entries: `<prefix>:<secret>` -> user id, expiring at
/// the same instant as the token that carries the secret.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, secret: &Secret) -> String {
        format!("{}:{}", self.prefix, secret.as_str())
    }

    fn secret(handle: &BackingHandle) -> Result<&Secret, AuthError> {
        match handle {
            BackingHandle::Secret(secret) => Ok(secret),
            BackingHandle::Record(_) => Err(AuthError::InternalError(
                "session store is addressed by secret".to_string(),
            )),
        }
    }
}

impl ToRedisArgs for UserId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.to_string().as_bytes())
    }
}

impl FromRedisValue for UserId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        let user_id = s.parse::<UserId>().map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid UserId string",
                e.to_string(),
            ))
        })?;
        Ok(user_id)
    }
}

#[async_trait::async_trait]
impl CredentialBackingStore for RedisSessionStore {
    async fn put(
        &self,
        user_id: UserId,
        secret: &Secret,
        expires_at: DateTime<Utc>,
    ) -> Result<BackingHandle, AuthError> {
        let key = self.key(secret);
        let exat = u64::try_from(expires_at.timestamp())
            .map_err(|e| AuthError::StoreWrite(e.to_string()))?;
        let options = SetOptions::default().with_expiration(SetExpiry::EXAT(exat));

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_options(&key, &user_id, options)
            .await
            .map_err(|e| AuthError::StoreWrite(e.to_string()))?;
        Ok(BackingHandle::Secret(secret.clone()))
    }

    async fn get(&self, handle: &BackingHandle) -> Result<Option<BackingEntry>, AuthError> {
        let secret = Self::secret(handle)?;
        let key = self.key(secret);
        let mut conn = self.conn.clone();
        let val: Option<UserId> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::StoreRead(e.to_string()))?;
        Ok(val.map(|user_id| BackingEntry {
            user_id,
            secret: secret.clone(),
            expires_at: None,
        }))
    }

    async fn revoke(&self, handle: &BackingHandle, _secret: &Secret) -> Result<bool, AuthError> {
        let key = self.key(Self::secret(handle)?);
        let mut conn = self.conn.clone();
        let removed: i64 = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::StoreWrite(e.to_string()))?;
        Ok(removed > 0)
    }
}
