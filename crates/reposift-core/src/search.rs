//! Repository search across every listing visible to a viewer.
//!
//! The search runs entirely through the [`RepoSource`] trait and holds no
//! state between calls.
//!
//! # Pipeline
//!
//! 1. Reject an empty query before any source is contacted.
//! 2. Gather owned, shared-in, group and (with org-view capability)
//!    org-public listings concurrently. Any failure or timeout fails the
//!    whole search.
//! 3. Concatenate the listings in that order and drop repeated ids, keeping
//!    the first occurrence.
//! 4. Drop virtual repositories and names not containing the query
//!    (case-insensitive), projecting the rest into [`SearchResultRecord`]s.
//! 5. Stable-sort by modification time, newest first.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use chrono_tz::Tz;
use futures_util::future::try_join4;
use tracing::{debug, instrument, trace, warn};

use crate::error::{DependencyError, InvalidQueryError};
use crate::format::{format_size, format_timestamp};
use crate::repo::{Permission, RepositoryRecord, SearchResponse, SearchResultRecord};
use crate::traits::{Page, RepoSource, SourceKind};
use crate::types::{Scope, Username};
use crate::Result;

/// Tuning knobs for a search, decoupled from any application config.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Upper bound for each individual source call. `None` waits forever.
    pub source_timeout: Option<Duration>,
    /// Zone used to render `mtime_relative`.
    pub time_zone: Tz,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            source_timeout: None,
            time_zone: chrono_tz::UTC,
        }
    }
}

/// Inputs for a single search.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    /// The account whose visible repositories are searched.
    pub viewer: &'a Username,
    /// Personal or organization context of the viewer.
    pub scope: Scope,
    /// Whether the viewer may see organization-public repositories.
    pub can_view_org: bool,
    /// Keyword matched against repository names.
    pub query: &'a str,
}

/// Search the repositories visible to the viewer.
///
/// Returns matches ordered by modification time, newest first. Fails with
/// [`Error::InvalidQuery`](crate::Error::InvalidQuery) for an empty query
/// and with [`Error::Dependency`](crate::Error::Dependency) if any source
/// fails.
#[instrument(
    skip_all,
    fields(viewer = %request.viewer, scope = %request.scope, query = request.query)
)]
pub async fn search<S>(
    source: &S,
    request: &SearchRequest<'_>,
    config: &SearchConfig,
) -> Result<SearchResponse>
where
    S: RepoSource + ?Sized,
{
    validate_query(request.query)?;

    let gathered = gather(source, request, config.source_timeout).await?;
    let gathered_count = gathered.len();

    let unique = dedupe(gathered);
    let mut repos = filter_and_project(unique, request.query, &config.time_zone);
    sort_by_recency(&mut repos);

    debug!(gathered = gathered_count, matched = repos.len(), "Search complete");

    Ok(SearchResponse { repos })
}

/// Reject an empty query. Whitespace-only queries are valid.
pub fn validate_query(query: &str) -> Result<()> {
    if query.is_empty() {
        return Err(InvalidQueryError::Empty.into());
    }
    Ok(())
}

/// Fetch all listings concurrently and concatenate them in gather order.
///
/// The first failing listing cancels the others.
pub async fn gather<S>(
    source: &S,
    request: &SearchRequest<'_>,
    source_timeout: Option<Duration>,
) -> Result<Vec<RepositoryRecord>>
where
    S: RepoSource + ?Sized,
{
    let viewer = request.viewer;
    let scope = request.scope;
    let can_view_org = request.can_view_org;

    let owned = bounded(
        SourceKind::Owned,
        source_timeout,
        source.owned_repos(viewer, &scope, true),
    );
    let shared_in = bounded(
        SourceKind::SharedIn,
        source_timeout,
        source.shared_in_repos(viewer, &scope, Page::all()),
    );
    let group = bounded(SourceKind::Group, source_timeout, source.group_repos(viewer));
    let org_public = bounded(SourceKind::OrgPublic, source_timeout, async {
        if can_view_org {
            source.org_public_repos(&scope).await
        } else {
            Ok(Vec::new())
        }
    });

    let (owned, shared_in, group, org_public) =
        try_join4(owned, shared_in, group, org_public).await?;

    debug!(
        owned = owned.len(),
        shared_in = shared_in.len(),
        group = group.len(),
        org_public = org_public.len(),
        "Gathered listings"
    );

    let mut records =
        Vec::with_capacity(owned.len() + shared_in.len() + group.len() + org_public.len());
    records.extend(owned);
    records.extend(shared_in);
    records.extend(group);
    records.extend(org_public);
    Ok(records)
}

/// Run one listing under the optional time budget.
async fn bounded<F>(
    provider: SourceKind,
    limit: Option<Duration>,
    listing: F,
) -> Result<Vec<RepositoryRecord>>
where
    F: Future<Output = Result<Vec<RepositoryRecord>>>,
{
    let result = match limit {
        Some(limit) => match tokio::time::timeout(limit, listing).await {
            Ok(result) => result,
            Err(_) => Err(DependencyError::Timeout {
                provider,
                duration_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }
            .into()),
        },
        None => listing.await,
    };

    let records = result.inspect_err(|e| warn!(%provider, error = %e, "Listing failed"))?;
    trace!(%provider, count = records.len(), "Listing returned");
    Ok(records)
}

/// Keep the first record for every id, preserving order.
pub fn dedupe(records: Vec<RepositoryRecord>) -> Vec<RepositoryRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| {
            let first = seen.insert(record.id.clone());
            if !first {
                trace!(id = %record.id, "Dropping duplicate listing");
            }
            first
        })
        .collect()
}

/// Drop virtual repositories and non-matching names, projecting the rest.
pub fn filter_and_project(
    records: Vec<RepositoryRecord>,
    query: &str,
    time_zone: &Tz,
) -> Vec<SearchResultRecord> {
    let needle = query.to_lowercase();
    records
        .into_iter()
        .filter(|record| !record.is_virtual)
        .filter(|record| record.name.to_lowercase().contains(&needle))
        .map(|record| project(record, time_zone))
        .collect()
}

/// Order results newest first; equal times keep their relative order.
pub fn sort_by_recency(results: &mut [SearchResultRecord]) {
    results.sort_by(|a, b| b.mtime.cmp(&a.mtime));
}

fn project(record: RepositoryRecord, time_zone: &Tz) -> SearchResultRecord {
    SearchResultRecord {
        mtime_relative: format_timestamp(record.last_modified, time_zone),
        size_formatted: format_size(record.size),
        id: record.id,
        name: record.name,
        mtime: record.last_modified,
        size: record.size,
        encrypted: record.encrypted,
        // Every gathered listing grants the viewer write access.
        permission: Permission::ReadWrite,
        is_virtual: false,
        root: String::new(),
        head_commit_id: record.head_commit_id,
        version: record.version,
    }
}
