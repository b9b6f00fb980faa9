use super::util::{uid_as_bytes, uid_from_bytes};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Refresh credential records in the `refresh_credential` table.
pub struct MySqlSecretStore {
    pool: MySqlPool,
}

impl MySqlSecretStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlSecretStore { pool }
    }

    fn record_id(handle: &BackingHandle) -> Result<RefreshCredentialId, AuthError> {
        match handle {
            BackingHandle::Record(id) => Ok(*id),
            BackingHandle::Secret(_) => Err(AuthError::InternalError(
                "secret store is addressed by record id".to_string(),
            )),
        }
    }

    fn row_to_record(row: MySqlRow) -> Result<RefreshCredentialRecord, AuthError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| AuthError::StoreRead(e.to_string()))?;
        let user_id_bytes: Vec<u8> = row
            .try_get("user_id")
            .map_err(|e| AuthError::StoreRead(e.to_string()))?;
        let secret: String = row
            .try_get("secret")
            .map_err(|e| AuthError::StoreRead(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| AuthError::StoreRead(e.to_string()))?;

        Ok(RefreshCredentialRecord {
            id: RefreshCredentialId(id),
            user_id: uid_from_bytes(&user_id_bytes)?,
            secret: Secret(secret),
            expires_at,
        })
    }

    pub async fn get_record(
        &self,
        id: RefreshCredentialId,
    ) -> Result<Option<RefreshCredentialRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, user_id, secret, expires_at
FROM refresh_credential
WHERE id = ?
"#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreRead(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }
}

#[async_trait::async_trait]
impl CredentialBackingStore for MySqlSecretStore {
    async fn put(
        &self,
        user_id: UserId,
        secret: &Secret,
        expires_at: DateTime<Utc>,
    ) -> Result<BackingHandle, AuthError> {
        let result = sqlx::query(
            r#"
INSERT INTO refresh_credential (user_id, secret, expires_at)
VALUES (?, ?, ?)
"#,
        )
        .bind(uid_as_bytes(&user_id))
        .bind(secret.as_str())
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreWrite(e.to_string()))?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|e| AuthError::StoreWrite(e.to_string()))?;
        Ok(BackingHandle::Record(RefreshCredentialId(id)))
    }

    async fn get(&self, handle: &BackingHandle) -> Result<Option<BackingEntry>, AuthError> {
        let id = Self::record_id(handle)?;
        let record = self.get_record(id).await?;
        Ok(record.map(|r| BackingEntry {
            user_id: r.user_id,
            secret: r.secret,
            expires_at: Some(r.expires_at),
        }))
    }

    async fn revoke(&self, handle: &BackingHandle, secret: &Secret) -> Result<bool, AuthError> {
        let id = Self::record_id(handle)?;
        // Matching on the secret too makes this a compare-and-delete: of two
        // concurrent rotations only one sees a removed row.
        let result = sqlx::query(
            r#"
DELETE FROM refresh_credential
WHERE id = ? AND secret = ?
"#,
        )
        .bind(id.0)
        .bind(secret.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreWrite(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
