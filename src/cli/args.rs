//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// git2graph - Synchronize git commit history into a property graph
#[derive(Parser, Debug)]
#[command(name = "git2graph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default lookup
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synchronize a repository into the graph
    #[command(
        name = "sync",
        long_about = "Synchronize a repository's commit history into the graph.\n\n\
            By default the sync is incremental: remotes are fetched, then each \
            remote branch is walked newest-first and only commits the graph does \
            not have yet are loaded. The walk of a branch stops at the first \
            commit already recorded.\n\n\
            With --full, every commit reachable from the remote branches is \
            exported to a batch file and loaded in one pass. Either way, the \
            repository's branch nodes are rebuilt at the end.",
        after_help = "\
WORKFLOW EXAMPLES:
    # First import of a repository
    git2graph sync ~/src/widgets --id acme/widgets --full

    # Pick up new commits later
    git2graph sync ~/src/widgets --id acme/widgets"
    )]
    Sync {
        /// Path to the repository (bare or with a working tree)
        path: PathBuf,

        /// Unique id of the Repository node
        #[arg(long)]
        id: String,

        /// Load the whole history instead of only new commits
        #[arg(long)]
        full: bool,
    },

    /// Write the transfer batch for a repository without loading it
    #[command(
        name = "export",
        long_about = "Walk every remote branch of a repository and write one row \
            per commit to the repository's batch file. Prints the batch path."
    )]
    Export {
        /// Path to the repository
        path: PathBuf,
    },

    /// Rebuild the branch nodes of a repository
    #[command(
        name = "branches",
        long_about = "Replace the repository's branch nodes with one per remote \
            branch, pointing at the commit the branch currently targets. \
            Branches whose commit is not in the graph yet are skipped."
    )]
    Branches {
        /// Path to the repository
        path: PathBuf,

        /// Unique id of the Repository node
        #[arg(long)]
        id: String,
    },

    /// Show the resolved configuration (secrets masked)
    #[command(name = "config")]
    Config,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    git2graph completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    git2graph completion zsh >> ~/.zshrc

    # Fish
    git2graph completion fish > ~/.config/fish/completions/git2graph.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sync_with_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "git2graph", "sync", "/srv/widgets", "--id", "acme/widgets", "--full", "--debug",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command {
            Command::Sync { path, id, full } => {
                assert_eq!(path, PathBuf::from("/srv/widgets"));
                assert_eq!(id, "acme/widgets");
                assert!(full);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn sync_requires_id() {
        assert!(Cli::try_parse_from(["git2graph", "sync", "/srv/widgets"]).is_err());
    }
}
