//! core::commit
//!
//! The normalized commit record every other layer operates on.
//!
//! A [`CommitRecord`] is produced by a commit source walk, serialized by
//! the exporter and merged into the graph by the loader. It carries no
//! backend types: hashes are validated [`Oid`]s and times are
//! [`CommitTime`] values that render both as a local-offset string and
//! as integer epoch seconds.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::types::Oid;

/// Format used for the local-offset rendering of commit times.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Name and email of an author or committer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A commit timestamp with the offset it was recorded in.
///
/// # Example
///
/// ```
/// use git2graph::core::commit::CommitTime;
///
/// let t = CommitTime::new(1_700_000_000, 120);
/// assert_eq!(t.epoch_seconds(), 1_700_000_000);
/// assert_eq!(t.formatted(), "2023-11-15 00:13:20 +0200");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTime {
    seconds: i64,
    offset_minutes: i32,
}

impl CommitTime {
    /// Create a time from epoch seconds and a UTC offset in minutes.
    pub fn new(seconds: i64, offset_minutes: i32) -> Self {
        Self {
            seconds,
            offset_minutes,
        }
    }

    /// Integer seconds since the Unix epoch.
    pub fn epoch_seconds(&self) -> i64 {
        self.seconds
    }

    /// Offset from UTC in minutes, as recorded by the committer.
    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }

    /// The time in its recorded offset.
    ///
    /// Out-of-range values fall back to the epoch / UTC rather than
    /// failing; git accepts arbitrary signature times.
    pub fn to_datetime(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.offset_minutes * 60).unwrap_or(Utc.fix());
        DateTime::from_timestamp(self.seconds, 0)
            .unwrap_or(DateTime::UNIX_EPOCH)
            .with_timezone(&offset)
    }

    /// Local-offset rendering, e.g. `2024-03-01 09:30:00 +0100`.
    pub fn formatted(&self) -> String {
        self.to_datetime().format(TIME_FORMAT).to_string()
    }
}

/// One commit, normalized.
///
/// Invariants: `hash` is never the zero OID (sources reject those), and
/// `parents` keeps the order the source reported. A commit with no
/// parents is a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: Oid,
    pub message: String,
    pub author: Signature,
    pub author_time: CommitTime,
    pub committer: Signature,
    pub commit_time: CommitTime,
    pub parents: Vec<Oid>,
}

impl CommitRecord {
    /// Whether this commit has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// The message made safe for the transfer format.
    pub fn transfer_message(&self) -> String {
        transfer_text(&self.message)
    }

    /// Parent hashes joined by single spaces; empty for a root.
    pub fn joined_parents(&self) -> String {
        self.parents
            .iter()
            .map(Oid::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Replace every `"` with `'` and every trailing `\` with `/`.
///
/// The transfer format has no escape for quotes, so they never reach it.
/// A field ending in a backslash would read as `\"` before its closing
/// quote, which CSV readers with backslash escaping take as a literal
/// quote.
pub fn transfer_text(text: &str) -> String {
    let text = text.replace('"', "'");
    let body = text.trim_end_matches('\\');
    let trailing = text.len() - body.len();
    format!("{}{}", body, "/".repeat(trailing))
}
