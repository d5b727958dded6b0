//! cli::commands::branches
//!
//! Rebuild a repository's branch nodes from its remote branches.

use std::path::Path;

use anyhow::{Context as _, Result};

use super::load_config;
use crate::cli::Context;
use crate::core::types::RepoId;
use crate::credentials::NoCredentials;
use crate::git::Git;
use crate::graph::HttpGraphSink;
use crate::sync::{SyncOptions, Synchronizer};
use crate::ui::output;

/// Run the branches command.
pub fn branches(ctx: &Context, path: &Path, id: &str) -> Result<()> {
    let config = load_config(ctx)?;
    let repo_id = RepoId::new(id).context("Invalid repository id")?;
    let git = Git::open(path).with_context(|| format!("Failed to open repository at {}", path.display()))?;

    let options = SyncOptions::from_config(&config, repo_id)?;
    let synchronizer = Synchronizer::new(&git, &NoCredentials, options);
    let mut sink = HttpGraphSink::from_config(&config).context("Failed to set up graph connection")?;

    let created = synchronizer
        .refresh_branches(&mut sink)
        .context("Branch refresh failed")?;
    output::print(format!("Refreshed {created} branches"), ctx.verbosity());
    Ok(())
}
