mod api_key_repo_mysql;
mod secret_store_mysql;
mod user_repo_mysql;

pub use api_key_repo_mysql::*;
pub use secret_store_mysql::*;
pub use user_repo_mysql::*;

mod util;
