use crate::application_port::AuthError;
use crate::domain_model::ApiKeyRecord;

#[async_trait::async_trait]
pub trait ApiKeyRepo: Send + Sync {
    async fn get_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, AuthError>;
}
