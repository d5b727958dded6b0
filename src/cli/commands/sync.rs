//! cli::commands::sync
//!
//! Synchronize a repository into the graph.
//!
//! # Example
//!
//! ```bash
//! # First import
//! git2graph sync ~/src/widgets --id acme/widgets --full
//!
//! # Later runs only add new commits
//! git2graph sync ~/src/widgets --id acme/widgets
//! ```

use std::path::Path;

use anyhow::{Context as _, Result};

use super::{credential_provider, load_config};
use crate::cli::Context;
use crate::core::types::RepoId;
use crate::git::Git;
use crate::graph::HttpGraphSink;
use crate::sync::{SyncOptions, Synchronizer};
use crate::ui::output;

/// Run the sync command.
pub fn sync(ctx: &Context, path: &Path, id: &str, full: bool) -> Result<()> {
    let config = load_config(ctx)?;
    let repo_id = RepoId::new(id).context("Invalid repository id")?;

    let git = Git::open(path).with_context(|| format!("Failed to open repository at {}", path.display()))?;
    let credentials = credential_provider(&config);
    let options = SyncOptions::from_config(&config, repo_id)?;
    let synchronizer = Synchronizer::new(&git, credentials.as_ref(), options);

    let mut sink = HttpGraphSink::from_config(&config).context("Failed to set up graph connection")?;
    output::debug(format!("graph endpoint: {}", sink.endpoint()), ctx.verbosity());

    let report = if full {
        synchronizer.full_sync(&mut sink).context("Full sync failed")?
    } else {
        synchronizer
            .incremental_sync(&mut sink)
            .context("Incremental sync failed")?
    };

    for line in output::format_tips(&report) {
        output::debug(line, ctx.verbosity());
    }
    if let Some(batch) = &report.batch {
        output::debug(format!("batch: {}", batch.display()), ctx.verbosity());
    }
    output::print(report.summary(), ctx.verbosity());
    Ok(())
}
