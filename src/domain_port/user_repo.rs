use crate::application_port::AuthError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Resolve a member by TSA id within the school identified by its TSA code.
    async fn find_by_identity(&self, identity: LoginIdentity)
    -> Result<Option<UserId>, AuthError>;
}
