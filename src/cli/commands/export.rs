//! cli::commands::export
//!
//! Write a repository's transfer batch without loading it.

use std::path::Path;

use anyhow::{Context as _, Result};

use super::load_config;
use crate::cli::Context;
use crate::core::types::RepoId;
use crate::credentials::NoCredentials;
use crate::git::{CommitSource, Git};
use crate::sync::{SyncOptions, Synchronizer};
use crate::ui::output;

/// Run the export command. Prints the batch path on stdout.
pub fn export(ctx: &Context, path: &Path) -> Result<()> {
    let config = load_config(ctx)?;
    let git = Git::open(path).with_context(|| format!("Failed to open repository at {}", path.display()))?;

    // The batch carries no repository id; the location stands in for it.
    let repo_id = RepoId::new(git.location().display().to_string()).context("Invalid repository path")?;
    let options = SyncOptions::from_config(&config, repo_id)?;
    let synchronizer = Synchronizer::new(&git, &NoCredentials, options);

    let summary = synchronizer.export().context("Export failed")?;
    output::debug(format!("{} rows", summary.rows), ctx.verbosity());
    println!("{}", summary.path.display());
    Ok(())
}
