//! export::row
//!
//! One transfer-format row.

use serde::{Deserialize, Serialize};

use crate::core::commit::{transfer_text, CommitRecord};

/// Column names, in order. Written once as the header row.
pub const COLUMNS: [&str; 9] = [
    "hash",
    "message",
    "author_name",
    "author_email",
    "author_time",
    "author_timestamp",
    "commit_time",
    "commit_timestamp",
    "parents",
];

/// A commit flattened into transfer columns.
///
/// Text fields never contain `"` and never end in `\`;
/// [`CommitRow::from_record`] rewrites them with [`transfer_text`].
/// `parents` is the space-joined parent hash list, empty for a root
/// commit.
///
/// Serializes to a JSON object keyed by [`COLUMNS`], which is the shape
/// the graph statements consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRow {
    pub hash: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: String,
    pub author_timestamp: i64,
    pub commit_time: String,
    pub commit_timestamp: i64,
    pub parents: String,
}

impl CommitRow {
    /// Flatten a commit record.
    pub fn from_record(record: &CommitRecord) -> Self {
        Self {
            hash: record.hash.to_string(),
            message: record.transfer_message(),
            author_name: transfer_text(&record.author.name),
            author_email: transfer_text(&record.author.email),
            author_time: record.author_time.formatted(),
            author_timestamp: record.author_time.epoch_seconds(),
            commit_time: record.commit_time.formatted(),
            commit_timestamp: record.commit_time.epoch_seconds(),
            parents: record.joined_parents(),
        }
    }

    /// Parent hashes, in source order.
    pub fn parent_hashes(&self) -> impl Iterator<Item = &str> {
        self.parents.split(' ').filter(|p| !p.is_empty())
    }

    /// Field values in [`COLUMNS`] order.
    pub(crate) fn fields(&self) -> [String; 9] {
        [
            self.hash.clone(),
            self.message.clone(),
            self.author_name.clone(),
            self.author_email.clone(),
            self.author_time.clone(),
            self.author_timestamp.to_string(),
            self.commit_time.clone(),
            self.commit_timestamp.to_string(),
            self.parents.clone(),
        ]
    }
}
