use crate::config::Config;
use anyhow::{Context, Result};

pub fn run(config: &Config) -> Result<()> {
    config.save().context("Failed to write config file")?;
    match Config::default_path() {
        Some(path) => println!("Wrote defaults to {}", path.display()),
        None => println!("No config directory is available on this platform"),
    }
    Ok(())
}
