mod auth_service_fake;
mod auth_service_impl;
mod credential_service_impl;
mod jwt_codec;

pub use auth_service_fake::*;
pub use auth_service_impl::*;
pub use credential_service_impl::*;
pub use jwt_codec::*;
