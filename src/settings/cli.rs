use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "nctsa", about = "Conference app backend")]
pub struct Cli {
    /// Path to the settings file. Defaults to `settings/dev.toml` in debug
    /// builds and `settings/release.toml` otherwise.
    #[arg(long)]
    pub settings: Option<String>,
}
