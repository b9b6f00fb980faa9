mod api_key;
mod credential;
mod user;

pub use api_key::*;
pub use credential::*;
pub use user::*;
