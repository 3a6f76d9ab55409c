//! Repository record types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::RepoId;

/// A repository as listed by a [`RepoSource`](crate::RepoSource).
///
/// Records are read-only to the search. Corrupted repositories may carry
/// default values in every field except `id` and `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Stable identifier, unique per logical repository.
    pub id: RepoId,

    /// Display name.
    pub name: String,

    /// Last modification time, seconds since the Unix epoch.
    #[serde(default, alias = "last_modify")]
    pub last_modified: i64,

    /// Size in bytes.
    #[serde(default)]
    pub size: u64,

    /// Whether the repository content is client-side encrypted.
    #[serde(default)]
    pub encrypted: bool,

    /// Whether this is a synthetic sub-view of another repository.
    #[serde(default)]
    pub is_virtual: bool,

    /// Id of the latest commit.
    #[serde(default, alias = "head_cmmt_id")]
    pub head_commit_id: String,

    /// Storage layout version.
    #[serde(default)]
    pub version: u32,

    /// Whether the storage layer failed to load the repository.
    #[serde(default)]
    pub corrupted: bool,
}

impl RepositoryRecord {
    /// Create a record with the given id and name and default metadata.
    pub fn new(id: RepoId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            last_modified: 0,
            size: 0,
            encrypted: false,
            is_virtual: false,
            head_commit_id: String::new(),
            version: 0,
            corrupted: false,
        }
    }
}

/// Effective permission reported for a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
    /// Read and write access.
    #[serde(rename = "rw")]
    ReadWrite,
    /// Read-only access.
    #[serde(rename = "r")]
    ReadOnly,
}

impl Permission {
    /// Returns the wire form (`"rw"` or `"r"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadWrite => "rw",
            Permission::ReadOnly => "r",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository matching a search, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultRecord {
    pub id: RepoId,
    pub name: String,
    /// Last modification time, seconds since the Unix epoch.
    pub mtime: i64,
    /// `mtime` as an RFC 3339 timestamp in the configured time zone.
    pub mtime_relative: String,
    pub size: u64,
    /// `size` in human-readable binary units.
    pub size_formatted: String,
    pub encrypted: bool,
    pub permission: Permission,
    /// Always false: virtual repositories never reach the results.
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    /// Path inside the repository; always the repository root.
    pub root: String,
    pub head_commit_id: String,
    pub version: u32,
}

/// The response document of a repository search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching repositories, most recently modified first.
    pub repos: Vec<SearchResultRecord>,
}
