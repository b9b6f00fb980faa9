use super::util::uid_from_bytes;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn find_by_identity(
        &self,
        identity: LoginIdentity,
    ) -> Result<Option<UserId>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT u.user_id
FROM user u
JOIN school s ON u.school_id = s.id
WHERE u.tsa_id = ? AND s.tsa_id = ?
"#,
        )
        .bind(identity.tsa_id)
        .bind(identity.school_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::StoreRead(format!("query user: {e}")))?;

        row_opt
            .map(|row| {
                let bytes: Vec<u8> = row
                    .try_get("user_id")
                    .map_err(|e| AuthError::StoreRead(e.to_string()))?;
                uid_from_bytes(&bytes)
            })
            .transpose()
    }
}
