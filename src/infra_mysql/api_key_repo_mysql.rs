use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlApiKeyRepo {
    pool: MySqlPool,
}

impl MySqlApiKeyRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlApiKeyRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<ApiKeyRecord, AuthError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| AuthError::StoreRead(e.to_string()))?;
        let key_hash: String = row
            .try_get("key_hash")
            .map_err(|e| AuthError::StoreRead(e.to_string()))?;
        let purpose: String = row
            .try_get("purpose")
            .map_err(|e| AuthError::StoreRead(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::StoreRead(e.to_string()))?;

        Ok(ApiKeyRecord {
            id,
            key_hash,
            purpose,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl ApiKeyRepo for MySqlApiKeyRepo {
    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, key_hash, purpose, created_at
FROM api_key
WHERE key_hash = ?
"#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreRead(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }
}
