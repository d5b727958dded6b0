//! config command - Show the resolved configuration

use anyhow::{Context as _, Result};

use super::load_config;
use crate::cli::Context;

/// Print the resolved configuration as TOML, secrets masked.
pub fn show(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;

    match config.loaded_from() {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# No config file found, using defaults"),
    }
    println!("# Environment: {}", config.env());

    let rendered = toml::to_string_pretty(&config.file.masked()).context("Failed to render config")?;
    print!("{}", rendered);
    Ok(())
}
