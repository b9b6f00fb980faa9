//! In-memory doubles for the storage ports, used by unit tests.

mod fixture;
mod stores;

pub use fixture::*;
pub use stores::*;
