//! Global `tracing` setup with a reloadable filter. Modules log through the
//! macros re-exported here.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
