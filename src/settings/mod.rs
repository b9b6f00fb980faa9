//! Settings file and command line. The file is TOML, overridable through
//! `NCTSA__*` environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
