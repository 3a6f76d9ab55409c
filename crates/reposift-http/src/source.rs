//! HTTP-backed repository source.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use reposift_core::Result;
use reposift_core::repo::RepositoryRecord;
use reposift_core::traits::{Page, RepoSource, SourceKind};
use reposift_core::types::{Scope, SourceUrl, Username};

use crate::client::ApiClient;
use crate::endpoints::*;

/// Repository source backed by a remote listing service.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: ApiClient,
}

impl HttpSource {
    /// Create a source for the listing service at `url`.
    pub fn new(url: SourceUrl) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(url)?,
        })
    }

    /// Authenticate every request with a bearer token.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.with_token(token),
        }
    }

    /// Returns the listing service URL.
    pub fn url(&self) -> &SourceUrl {
        self.client.base()
    }

    async fn list<Q>(
        &self,
        kind: SourceKind,
        path: &str,
        params: &Q,
    ) -> Result<Vec<RepositoryRecord>>
    where
        Q: Serialize + std::fmt::Debug + Sync,
    {
        let response: ListingResponse = self.client.get(kind, path, params).await?;
        let records = parse_records(response.repos, kind);
        debug!(%kind, count = records.len(), "Listed repositories");
        Ok(records)
    }
}

/// Decode listing entries, skipping the ones that are not valid records.
fn parse_records(entries: Vec<serde_json::Value>, kind: SourceKind) -> Vec<RepositoryRecord> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%kind, index, error = %e, "Skipping malformed repository record");
                None
            }
        })
        .collect()
}

#[async_trait]
impl RepoSource for HttpSource {
    #[instrument(skip(self))]
    async fn owned_repos(
        &self,
        viewer: &Username,
        scope: &Scope,
        include_corrupted: bool,
    ) -> Result<Vec<RepositoryRecord>> {
        let query = OwnedQuery {
            user: viewer.as_str(),
            org_id: scope.org_id().map(|o| o.get()),
            include_corrupted,
        };
        self.list(SourceKind::Owned, OWNED_REPOS, &query).await
    }

    #[instrument(skip(self))]
    async fn shared_in_repos(
        &self,
        viewer: &Username,
        scope: &Scope,
        page: Page,
    ) -> Result<Vec<RepositoryRecord>> {
        let query = SharedInQuery {
            user: viewer.as_str(),
            org_id: scope.org_id().map(|o| o.get()),
            offset: page.offset,
            limit: page.limit,
        };
        self.list(SourceKind::SharedIn, SHARED_IN_REPOS, &query).await
    }

    #[instrument(skip(self))]
    async fn group_repos(&self, viewer: &Username) -> Result<Vec<RepositoryRecord>> {
        let query = GroupQuery {
            user: viewer.as_str(),
        };
        self.list(SourceKind::Group, GROUP_REPOS, &query).await
    }

    #[instrument(skip(self))]
    async fn org_public_repos(&self, scope: &Scope) -> Result<Vec<RepositoryRecord>> {
        let query = PublicQuery {
            org_id: scope.org_id().map(|o| o.get()),
        };
        self.list(SourceKind::OrgPublic, PUBLIC_REPOS, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_entries_are_skipped() {
        let entries = vec![
            json!({ "id": "a1", "name": "ok" }),
            json!({ "name": "no id" }),
            json!("not an object"),
            json!({ "id": "b2", "name": "also ok", "size": 10 }),
        ];

        let records = parse_records(entries, SourceKind::Owned);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2"]);
    }
}
