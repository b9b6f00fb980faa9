mod auth_service;
mod credential;

pub use auth_service::*;
pub use credential::*;
