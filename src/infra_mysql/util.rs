use crate::application_port::AuthError;
use crate::domain_model::UserId;
use uuid::Uuid;

// User ids are stored as BINARY(16).

#[inline]
pub fn uid_as_bytes(id: &UserId) -> &[u8] {
    id.0.as_bytes()
}

#[inline]
pub fn uid_from_bytes(id: &[u8]) -> Result<UserId, AuthError> {
    Ok(UserId(
        Uuid::from_slice(id).map_err(|e| AuthError::StoreRead(e.to_string()))?,
    ))
}
