use crate::application_port::AuthError;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Indexed store with auto-increment ids, like the `refresh_credential` table.
#[derive(Default)]
pub struct MemorySecretStore {
    rows: DashMap<i64, RefreshCredentialRecord>,
    next_id: AtomicI64,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait::async_trait]
impl CredentialBackingStore for MemorySecretStore {
    async fn put(
        &self,
        user_id: UserId,
        secret: &Secret,
        expires_at: DateTime<Utc>,
    ) -> Result<BackingHandle, AuthError> {
        let id = RefreshCredentialId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.rows.insert(
            id.0,
            RefreshCredentialRecord {
                id,
                user_id,
                secret: secret.clone(),
                expires_at,
            },
        );
        Ok(BackingHandle::Record(id))
    }

    async fn get(&self, handle: &BackingHandle) -> Result<Option<BackingEntry>, AuthError> {
        let BackingHandle::Record(id) = handle else {
            return Err(AuthError::StoreRead("expected a record handle".to_string()));
        };
        Ok(self.rows.get(&id.0).map(|row| BackingEntry {
            user_id: row.user_id,
            secret: row.secret.clone(),
            expires_at: Some(row.expires_at),
        }))
    }

    async fn revoke(&self, handle: &BackingHandle, secret: &Secret) -> Result<bool, AuthError> {
        let BackingHandle::Record(id) = handle else {
            return Err(AuthError::StoreWrite("expected a record handle".to_string()));
        };
        Ok(self
            .rows
            .remove_if(&id.0, |_, row| row.secret == *secret)
            .is_some())
    }
}

/// Keyed store whose entries vanish once their TTL has passed on `clock`.
pub struct MemorySessionStore {
    entries: DashMap<String, (UserId, DateTime<Utc>)>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MemorySessionStore {
            entries: DashMap::new(),
            clock,
        }
    }

    fn key(secret: &Secret) -> String {
        format!("TOKEN:{}", secret.as_str())
    }

    /// Bind `secret` to `user_id` directly, bypassing the issuer.
    pub fn insert(&self, secret: &Secret, user_id: UserId, expires_at: DateTime<Utc>) {
        self.entries
            .insert(Self::key(secret), (user_id, expires_at));
    }

    pub fn purge(&self, secret: &Secret) {
        self.entries.remove(&Self::key(secret));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait::async_trait]
impl CredentialBackingStore for MemorySessionStore {
    async fn put(
        &self,
        user_id: UserId,
        secret: &Secret,
        expires_at: DateTime<Utc>,
    ) -> Result<BackingHandle, AuthError> {
        self.insert(secret, user_id, expires_at);
        Ok(BackingHandle::Secret(secret.clone()))
    }

    async fn get(&self, handle: &BackingHandle) -> Result<Option<BackingEntry>, AuthError> {
        let BackingHandle::Secret(secret) = handle else {
            return Err(AuthError::StoreRead("expected a secret handle".to_string()));
        };
        let now = self.clock.now();
        Ok(self
            .entries
            .get(&Self::key(secret))
            .filter(|entry| entry.1 > now)
            .map(|entry| BackingEntry {
                user_id: entry.0,
                secret: secret.clone(),
                expires_at: None,
            }))
    }

    async fn revoke(&self, handle: &BackingHandle, _secret: &Secret) -> Result<bool, AuthError> {
        let BackingHandle::Secret(secret) = handle else {
            return Err(AuthError::StoreWrite("expected a secret handle".to_string()));
        };
        Ok(self.entries.remove(&Self::key(secret)).is_some())
    }
}

/// Wraps another store and fails every call while switched off, the way a
/// backend behaves during an outage. Counts `put` calls.
pub struct FlakyStore {
    inner: Arc<dyn CredentialBackingStore>,
    down: AtomicBool,
    puts: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn CredentialBackingStore>) -> Self {
        FlakyStore {
            inner,
            down: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn is_down(&self) -> bool {
        self.down.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CredentialBackingStore for FlakyStore {
    async fn put(
        &self,
        user_id: UserId,
        secret: &Secret,
        expires_at: DateTime<Utc>,
    ) -> Result<BackingHandle, AuthError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.is_down() {
            return Err(AuthError::StoreWrite("store unavailable".to_string()));
        }
        self.inner.put(user_id, secret, expires_at).await
    }

    async fn get(&self, handle: &BackingHandle) -> Result<Option<BackingEntry>, AuthError> {
        if self.is_down() {
            return Err(AuthError::StoreRead("store unavailable".to_string()));
        }
        self.inner.get(handle).await
    }

    async fn revoke(&self, handle: &BackingHandle, secret: &Secret) -> Result<bool, AuthError> {
        if self.is_down() {
            return Err(AuthError::StoreWrite("store unavailable".to_string()));
        }
        self.inner.revoke(handle, secret).await
    }
}

#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<LoginIdentity, UserId>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, tsa_id: i64, school_code: i64) -> UserId {
        let user_id = UserId(uuid::Uuid::new_v4());
        self.users.insert(
            LoginIdentity {
                tsa_id,
                school_code,
            },
            user_id,
        );
        user_id
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_identity(
        &self,
        identity: LoginIdentity,
    ) -> Result<Option<UserId>, AuthError> {
        Ok(self.users.get(&identity).map(|u| *u))
    }
}

#[derive(Default)]
pub struct MemoryApiKeyRepo {
    keys: DashMap<String, ApiKeyRecord>,
}

impl MemoryApiKeyRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, key: &str, purpose: &str) {
        let key_hash = hash_api_key(key);
        let record = ApiKeyRecord {
            id: self.keys.len() as i64 + 1,
            key_hash: key_hash.clone(),
            purpose: purpose.to_string(),
            created_at: Utc::now(),
        };
        self.keys.insert(key_hash, record);
    }
}

#[async_trait::async_trait]
impl ApiKeyRepo for MemoryApiKeyRepo {
    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, AuthError> {
        Ok(self.keys.get(key_hash).map(|r| r.clone()))
    }
}
