//! sync
//!
//! Full and incremental synchronization of one repository into a graph.
//!
//! # Full sync
//!
//! ```text
//! lock → constraints → Repository → walk all tips → batch file → load → branches
//! ```
//!
//! One walk over every remote tip (shared ancestors visited once) is
//! exported to the repository's batch file, which is then loaded either
//! server-side ([`LoadStrategy::File`]) or as parameter chunks
//! ([`LoadStrategy::Inline`]).
//!
//! # Incremental sync
//!
//! ```text
//! lock → fetch → constraints → Repository → per tip: walk newest-first
//!     known commit?  yes → stop this tip (FoundKnown)
//!                    no  → load it now, continue to its parents
//!     root reached       → Exhausted
//! → branches
//! ```
//!
//! Each new commit is loaded as soon as it is seen, so an interrupted run
//! keeps its progress. A failed lookup or load aborts the run without
//! undoing earlier loads. The next incremental run stops at the newest
//! loaded commit, so older commits the failed run never reached stay
//! parent placeholders until a full sync completes them.
//!
//! # Example
//!
//! ```
//! use git2graph::core::types::RepoId;
//! use git2graph::credentials::NoCredentials;
//! use git2graph::git::mock::MockSource;
//! use git2graph::graph::MemoryGraph;
//! use git2graph::sync::{SyncOptions, Synchronizer};
//!
//! let source = MockSource::new("/srv/widgets");
//! source.commit("A", &[], 1);
//! source.commit("B", &["A"], 2);
//! source.set_remote_ref("origin/main", "B");
//!
//! let dir = tempfile::tempdir().unwrap();
//! let options = SyncOptions::new(RepoId::new("widgets").unwrap(), dir.path());
//! let sync = Synchronizer::new(&source, &NoCredentials, options);
//!
//! let mut graph = MemoryGraph::new();
//! let report = sync.incremental_sync(&mut graph).unwrap();
//! assert_eq!(report.commits_loaded, 2);
//! assert_eq!(graph.branches("widgets").len(), 1);
//! ```

mod report;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::{Config, ConfigError, LoadStrategy};
use crate::core::lock::{LockError, SyncLock};
use crate::core::paths::BatchPaths;
use crate::core::types::{Oid, RepoId};
use crate::credentials::CredentialProvider;
use crate::export::{export_walk, BatchReader, ExportError, ExportSummary};
use crate::git::{CommitSource, GitError, ReferenceTip, WalkControl, WalkOrder, WalkOutcome};
use crate::graph::{GraphLoader, GraphSink, SinkError};

pub use report::{SyncMode, SyncReport, TipOutcome, TipReport};

/// Errors from a synchronization pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading the repository or fetching failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Writing or reading the transfer batch failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The graph rejected a statement.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// Another sync of this repository is running.
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Settings for one repository's synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub repo_id: RepoId,
    /// Directory for the transfer batch and lock file.
    pub batch_dir: PathBuf,
    pub load: LoadStrategy,
    pub batch_size: usize,
    /// Walk order for full exports. Incremental walks are always
    /// newest-first.
    pub order: WalkOrder,
}

impl SyncOptions {
    /// Options with default load strategy, batch size and order.
    pub fn new(repo_id: RepoId, batch_dir: impl Into<PathBuf>) -> Self {
        let defaults = Config::default();
        Self {
            repo_id,
            batch_dir: batch_dir.into(),
            load: defaults.load_strategy(),
            batch_size: defaults.batch_size(),
            order: defaults.walk_order(),
        }
    }

    /// Options from the `[sync]` section.
    pub fn from_config(config: &Config, repo_id: RepoId) -> Result<Self, SyncError> {
        Ok(Self {
            repo_id,
            batch_dir: config.batch_dir()?,
            load: config.load_strategy(),
            batch_size: config.batch_size(),
            order: config.walk_order(),
        })
    }

    pub fn with_load(mut self, load: LoadStrategy) -> Self {
        self.load = load;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_order(mut self, order: WalkOrder) -> Self {
        self.order = order;
        self
    }
}

/// Synchronizes one repository.
pub struct Synchronizer<'a> {
    source: &'a dyn CommitSource,
    credentials: &'a dyn CredentialProvider,
    options: SyncOptions,
}

impl std::fmt::Debug for Synchronizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("location", &self.source.location())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> Synchronizer<'a> {
    pub fn new(
        source: &'a dyn CommitSource,
        credentials: &'a dyn CredentialProvider,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            credentials,
            options,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Batch file and lock paths for this repository.
    pub fn paths(&self) -> BatchPaths {
        BatchPaths::new(&self.options.batch_dir, self.source.location())
    }

    /// Load the whole history reachable from the remote tips.
    pub fn full_sync(&self, sink: &mut dyn GraphSink) -> Result<SyncReport, SyncError> {
        let paths = self.paths();
        let _lock = SyncLock::acquire(&paths)?;
        info!(repo = %self.options.repo_id, location = %self.source.location().display(), "full sync");

        let tips = self.source.reference_tips()?;
        let mut loader = self.loader(sink)?;

        let summary = self.export_tips(&tips, &paths.batch_file())?;
        let commits_loaded = match self.options.load {
            LoadStrategy::File => {
                loader.load_batch_file(&summary.path)?;
                summary.rows
            }
            LoadStrategy::Inline => {
                let rows = BatchReader::read(&summary.path)?;
                loader.load_rows(&rows)?
            }
        };

        let mut report = SyncReport::new(SyncMode::Full);
        report.commits_loaded = commits_loaded;
        report.batch = Some(summary.path);
        report.branches_refreshed = loader.refresh_branches(&tips)?;
        Ok(report)
    }

    /// Fetch, then load only the commits newer than what the graph has.
    pub fn incremental_sync(&self, sink: &mut dyn GraphSink) -> Result<SyncReport, SyncError> {
        let _lock = SyncLock::acquire(&self.paths())?;
        info!(repo = %self.options.repo_id, location = %self.source.location().display(), "incremental sync");

        let remotes = self.source.fetch_remotes(self.credentials)?;
        debug!(?remotes, "fetched remotes");

        let tips = self.source.reference_tips()?;
        let mut loader = self.loader(sink)?;
        let mut report = SyncReport::new(SyncMode::Incremental);

        for tip in &tips {
            let tip_report = self.sync_tip(&mut loader, tip)?;
            report.commits_loaded += tip_report.loaded;
            report.tips.push(tip_report);
        }

        report.branches_refreshed = loader.refresh_branches(&tips)?;
        info!(loaded = report.commits_loaded, "incremental sync done");
        Ok(report)
    }

    /// Rebuild only the Branch nodes from the current remote tips.
    ///
    /// Holds the sync lock, since a concurrent refresh would duplicate
    /// Branch nodes.
    pub fn refresh_branches(&self, sink: &mut dyn GraphSink) -> Result<usize, SyncError> {
        let _lock = SyncLock::acquire(&self.paths())?;
        let tips = self.source.reference_tips()?;
        let mut loader = GraphLoader::new(sink, self.options.repo_id.clone(), self.options.batch_size);
        Ok(loader.refresh_branches(&tips)?)
    }

    /// Write the transfer batch for every remote tip without loading it.
    pub fn export(&self) -> Result<ExportSummary, SyncError> {
        let paths = self.paths();
        let _lock = SyncLock::acquire(&paths)?;
        let tips = self.source.reference_tips()?;
        self.export_tips(&tips, &paths.batch_file())
    }

    fn loader<'s>(&self, sink: &'s mut dyn GraphSink) -> Result<GraphLoader<'s>, SyncError> {
        let mut loader = GraphLoader::new(sink, self.options.repo_id.clone(), self.options.batch_size);
        loader.ensure_constraints()?;
        loader.merge_repository(self.source.location())?;
        Ok(loader)
    }

    fn export_tips(&self, tips: &[ReferenceTip], path: &Path) -> Result<ExportSummary, SyncError> {
        let mut starts: Vec<Oid> = tips.iter().map(|t| t.target.clone()).collect();
        starts.sort();
        starts.dedup();
        debug!(tips = starts.len(), order = %self.options.order, "walking for export");

        let walk = self.source.walk(&starts, self.options.order)?;
        Ok(export_walk(walk, path)?)
    }

    fn sync_tip(&self, loader: &mut GraphLoader<'_>, tip: &ReferenceTip) -> Result<TipReport, SyncError> {
        debug!(reference = %tip.name, target = %tip.target, "walking tip");
        let mut loaded = 0;

        let outcome = self
            .source
            .walk(std::slice::from_ref(&tip.target), WalkOrder::Time)?
            .visit(|commit| -> Result<WalkControl, SyncError> {
                if loader.is_known(&commit.hash)? {
                    return Ok(WalkControl::Stop);
                }
                loader.load_commit(commit)?;
                loaded += 1;
                Ok(WalkControl::Continue)
            })?;

        let outcome = match outcome {
            WalkOutcome::Stopped { at, .. } => {
                debug!(reference = %tip.name, frontier = %at, loaded, "found known commit");
                TipOutcome::FoundKnown { frontier: at }
            }
            WalkOutcome::Exhausted { .. } => {
                debug!(reference = %tip.name, loaded, "walk exhausted");
                TipOutcome::Exhausted
            }
        };

        Ok(TipReport {
            reference: tip.name.clone(),
            outcome,
            loaded,
        })
    }
}
