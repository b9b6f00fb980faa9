// store

mod credential_backing_store;

pub use credential_backing_store::*;

// repo

mod api_key_repo;
mod user_repo;

pub use api_key_repo::*;
pub use user_repo::*;

mod clock;

pub use clock::*;
