//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the configuration (once) and validates its own arguments
//! 2. Builds the commit source, credentials and graph sink it needs
//! 3. Calls into [`crate::sync`] and formats the result
//!
//! Handlers return `anyhow::Result`; typed errors from lower layers are
//! wrapped with context here.

mod branches;
mod completion;
mod config_cmd;
mod export;
mod sync;

use anyhow::{Context as _, Result};

use super::args::Command;
use super::Context;
use crate::core::config::Config;
use crate::credentials::{CredentialProvider, NoCredentials, SshKeyCredentials};
use crate::ui::output;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Sync { path, id, full } => sync::sync(ctx, &path, &id, full),
        Command::Export { path } => export::export(ctx, &path),
        Command::Branches { path, id } => branches::branches(ctx, &path, &id),
        Command::Config => config_cmd::show(ctx),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load the configuration, printing any load warnings.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    let loaded = Config::load(ctx.config.as_deref()).context("Failed to load config")?;
    for warning in &loaded.warnings {
        output::warn(&warning.message, ctx.verbosity());
    }
    if let Some(path) = loaded.config.loaded_from() {
        output::debug(format!("config: {}", path.display()), ctx.verbosity());
    }
    Ok(loaded.config)
}

/// Credentials from the `[credentials]` section, or transport defaults.
pub(crate) fn credential_provider(config: &Config) -> Box<dyn CredentialProvider> {
    match config.credentials().and_then(SshKeyCredentials::from_config) {
        Some(ssh) => Box::new(ssh),
        None => Box::new(NoCredentials),
    }
}
