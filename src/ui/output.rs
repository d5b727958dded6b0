//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Human-facing lines go to stdout and respect the quiet flag. Errors and
//! warnings go to stderr. Diagnostic logging is separate and goes through
//! `tracing`.

use std::fmt::Display;

use crate::sync::{SyncReport, TipOutcome};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// One line per walked tip, e.g. `refs/remotes/origin/main: 2 new, stopped at 1a2b3c4`.
pub fn format_tips(report: &SyncReport) -> Vec<String> {
    report
        .tips
        .iter()
        .map(|tip| match &tip.outcome {
            TipOutcome::FoundKnown { frontier } => format!(
                "{}: {} new, stopped at {}",
                tip.reference,
                tip.loaded,
                frontier.short(7)
            ),
            TipOutcome::Exhausted => {
                format!("{}: {} new, reached root", tip.reference, tip.loaded)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Oid, RefName};
    use crate::sync::{SyncMode, TipReport};

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn tips_formatted() {
        let report = SyncReport {
            mode: SyncMode::Incremental,
            tips: vec![
                TipReport {
                    reference: RefName::new("refs/remotes/origin/main").unwrap(),
                    outcome: TipOutcome::FoundKnown {
                        frontier: Oid::new("abcdef1234".repeat(4)).unwrap(),
                    },
                    loaded: 2,
                },
                TipReport {
                    reference: RefName::new("refs/remotes/origin/dev").unwrap(),
                    outcome: TipOutcome::Exhausted,
                    loaded: 5,
                },
            ],
            commits_loaded: 7,
            branches_refreshed: 2,
            batch: None,
        };
        assert_eq!(
            format_tips(&report),
            vec![
                "refs/remotes/origin/main: 2 new, stopped at abcdef1".to_string(),
                "refs/remotes/origin/dev: 5 new, reached root".to_string(),
            ]
        );
    }
}
