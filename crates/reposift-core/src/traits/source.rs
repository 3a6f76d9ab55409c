//! Repository source trait.

use async_trait::async_trait;
use std::fmt;

use crate::repo::RepositoryRecord;
use crate::types::{Scope, Username};
use crate::Result;

/// The listing a repository came from.
///
/// Variants are declared in gather order: when a repository is listed by
/// more than one source, the earliest kind wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// Repositories owned by the viewer.
    Owned,
    /// Repositories shared directly with the viewer.
    SharedIn,
    /// Repositories shared with a group the viewer belongs to.
    Group,
    /// Repositories published to the whole organization.
    OrgPublic,
}

impl SourceKind {
    /// All kinds, in gather order.
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Owned,
        SourceKind::SharedIn,
        SourceKind::Group,
        SourceKind::OrgPublic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Owned => "owned",
            SourceKind::SharedIn => "shared-in",
            SourceKind::Group => "group",
            SourceKind::OrgPublic => "org-public",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A window over a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Number of entries to skip.
    pub offset: usize,
    /// Maximum number of entries to return; `None` means no limit.
    pub limit: Option<usize>,
}

impl Page {
    /// The whole listing.
    pub const fn all() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    /// Apply this window to an already ordered listing.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::all()
    }
}

/// A provider of repository listings.
///
/// Each method returns records in the provider's own order; the search keeps
/// that order when merging. Implementations skip individual records they
/// cannot parse and only fail when the listing as a whole is unavailable.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Repositories owned by `viewer` within `scope`.
    ///
    /// Corrupted repositories are listed only if `include_corrupted` is set.
    async fn owned_repos(
        &self,
        viewer: &Username,
        scope: &Scope,
        include_corrupted: bool,
    ) -> Result<Vec<RepositoryRecord>>;

    /// Repositories other users shared directly with `viewer` within `scope`.
    async fn shared_in_repos(
        &self,
        viewer: &Username,
        scope: &Scope,
        page: Page,
    ) -> Result<Vec<RepositoryRecord>>;

    /// Repositories shared with any group `viewer` is a member of.
    async fn group_repos(&self, viewer: &Username) -> Result<Vec<RepositoryRecord>>;

    /// Repositories published to everyone in `scope`.
    async fn org_public_repos(&self, scope: &Scope) -> Result<Vec<RepositoryRecord>>;
}
