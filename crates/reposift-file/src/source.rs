//! File-backed repository source.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, instrument};

use reposift_core::error::{Error, InvalidInputError};
use reposift_core::repo::RepositoryRecord;
use reposift_core::traits::{Page, RepoSource};
use reposift_core::types::{RepoId, Scope, SourceUrl, Username};
use reposift_core::Result;

use crate::store::{FileStore, StoredRepo};

/// Repository source reading a filesystem catalog.
#[derive(Debug, Clone)]
pub struct FileSource {
    store: FileStore,
}

impl FileSource {
    /// Create a source over the catalog at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            store: FileStore::new(root),
        }
    }

    /// Create a source from a `file://` URL.
    pub fn from_url(url: &SourceUrl) -> Result<Self> {
        let path = url.to_file_path().ok_or_else(|| {
            Error::InvalidInput(InvalidInputError::SourceUrl {
                value: url.to_string(),
                reason: "not a file:// catalog".to_string(),
            })
        })?;
        Ok(Self::new(path))
    }

    /// Access the underlying catalog.
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Resolve listed ids to records.
    ///
    /// Ids with no repository and corrupted repositories are skipped.
    fn resolve<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a RepoId>,
        keep: impl Fn(&StoredRepo) -> bool,
    ) -> Result<Vec<RepositoryRecord>> {
        let mut records = Vec::new();
        for id in ids {
            match self.store.get_repo(id)? {
                Some(repo) if !repo.record.corrupted && keep(&repo) => records.push(repo.record),
                Some(_) => {}
                None => debug!(%id, "Skipping dangling repository id"),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl RepoSource for FileSource {
    #[instrument(skip(self))]
    async fn owned_repos(
        &self,
        viewer: &Username,
        scope: &Scope,
        include_corrupted: bool,
    ) -> Result<Vec<RepositoryRecord>> {
        let records: Vec<RepositoryRecord> = self
            .store
            .list_repos()?
            .into_iter()
            .filter(|r| &r.owner == viewer && scope.contains(r.org_id))
            .filter(|r| include_corrupted || !r.record.corrupted)
            .map(|r| r.record)
            .collect();

        debug!(count = records.len(), "Listed owned repositories");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn shared_in_repos(
        &self,
        viewer: &Username,
        scope: &Scope,
        page: Page,
    ) -> Result<Vec<RepositoryRecord>> {
        let ids = self.store.shares_for(viewer)?;
        let records = self.resolve(&ids, |r| scope.contains(r.org_id))?;
        let records = page.apply(records);

        debug!(count = records.len(), "Listed shared-in repositories");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn group_repos(&self, viewer: &Username) -> Result<Vec<RepositoryRecord>> {
        let mut records = Vec::new();
        for group in self.store.groups_of(viewer)? {
            records.extend(self.resolve(&group.repos, |_| true)?);
        }

        debug!(count = records.len(), "Listed group repositories");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn org_public_repos(&self, scope: &Scope) -> Result<Vec<RepositoryRecord>> {
        let records: Vec<RepositoryRecord> = self
            .store
            .list_repos()?
            .into_iter()
            .filter(|r| r.public && !r.record.corrupted && scope.contains(r.org_id))
            .map(|r| r.record)
            .collect();

        debug!(count = records.len(), "Listed public repositories");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reposift_core::types::OrgId;
    use tempfile::TempDir;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn stored(id: &str, name: &str, owner: &str, org: Option<i64>) -> StoredRepo {
        StoredRepo {
            record: RepositoryRecord::new(RepoId::new(id).unwrap(), name),
            owner: user(owner),
            org_id: org.map(|o| OrgId::new(o).unwrap()),
            public: false,
        }
    }

    fn ids(records: &[RepositoryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn owned_respects_scope_and_corruption() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::new(temp.path());
        let store = source.store();

        store.add_repo(&stored("b2", "Beta", "alice", None)).unwrap();
        store.add_repo(&stored("a1", "Alpha", "alice", None)).unwrap();
        store.add_repo(&stored("c3", "Work", "alice", Some(7))).unwrap();
        store.add_repo(&stored("d4", "Other", "bob", None)).unwrap();
        let mut broken = stored("e5", "Broken", "alice", None);
        broken.record.corrupted = true;
        store.add_repo(&broken).unwrap();

        let personal = source
            .owned_repos(&user("alice"), &Scope::Personal, false)
            .await
            .unwrap();
        assert_eq!(ids(&personal), vec!["a1", "b2"]);

        let with_corrupted = source
            .owned_repos(&user("alice"), &Scope::Personal, true)
            .await
            .unwrap();
        assert_eq!(ids(&with_corrupted), vec!["a1", "b2", "e5"]);

        let org = Scope::Org(OrgId::new(7).unwrap());
        let in_org = source.owned_repos(&user("alice"), &org, true).await.unwrap();
        assert_eq!(ids(&in_org), vec!["c3"]);
    }

    #[tokio::test]
    async fn shared_in_keeps_share_order_and_pages() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::new(temp.path());
        let store = source.store();

        for id in ["a1", "b2", "c3"] {
            store.add_repo(&stored(id, id, "bob", None)).unwrap();
        }
        store.add_repo(&stored("d4", "org", "bob", Some(3))).unwrap();

        let alice = user("alice");
        for id in ["c3", "d4", "a1", "b2"] {
            store.share_with_user(&RepoId::new(id).unwrap(), &alice).unwrap();
        }

        let all = source
            .shared_in_repos(&alice, &Scope::Personal, Page::all())
            .await
            .unwrap();
        assert_eq!(ids(&all), vec!["c3", "a1", "b2"]);

        let window = Page {
            offset: 1,
            limit: Some(1),
        };
        let paged = source
            .shared_in_repos(&alice, &Scope::Personal, window)
            .await
            .unwrap();
        assert_eq!(ids(&paged), vec!["a1"]);
    }

    #[tokio::test]
    async fn dangling_ids_are_skipped() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::new(temp.path());
        let store = source.store();

        store.add_repo(&stored("a1", "Alpha", "bob", None)).unwrap();
        store.add_repo(&stored("b2", "Beta", "bob", None)).unwrap();
        store.share_with_user(&RepoId::new("a1").unwrap(), &user("alice")).unwrap();
        store.share_with_user(&RepoId::new("b2").unwrap(), &user("alice")).unwrap();

        std::fs::remove_file(temp.path().join("repos").join("a1.json")).unwrap();

        let shared = source
            .shared_in_repos(&user("alice"), &Scope::Personal, Page::all())
            .await
            .unwrap();
        assert_eq!(ids(&shared), vec!["b2"]);
    }

    #[tokio::test]
    async fn group_repos_follow_group_order() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::new(temp.path());
        let store = source.store();

        for id in ["a1", "b2", "c3"] {
            store.add_repo(&stored(id, id, "carol", None)).unwrap();
        }

        let alice = user("alice");
        let first = store.create_group("eng", &[alice.clone()]).unwrap();
        let second = store.create_group("ops", &[alice.clone()]).unwrap();
        let other = store.create_group("sales", &[user("bob")]).unwrap();

        store.share_with_group(&RepoId::new("c3").unwrap(), first).unwrap();
        store.share_with_group(&RepoId::new("a1").unwrap(), first).unwrap();
        store.share_with_group(&RepoId::new("b2").unwrap(), second).unwrap();
        store.share_with_group(&RepoId::new("a1").unwrap(), other).unwrap();

        let repos = source.group_repos(&alice).await.unwrap();
        assert_eq!(ids(&repos), vec!["c3", "a1", "b2"]);
    }

    #[tokio::test]
    async fn public_repos_match_scope() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::new(temp.path());
        let store = source.store();

        store.add_repo(&stored("a1", "Handbook", "bob", Some(5))).unwrap();
        store.add_repo(&stored("b2", "Private", "bob", Some(5))).unwrap();
        store.add_repo(&stored("c3", "Elsewhere", "bob", Some(6))).unwrap();
        store.set_public(&RepoId::new("a1").unwrap(), true).unwrap();
        store.set_public(&RepoId::new("c3").unwrap(), true).unwrap();

        let org = Scope::Org(OrgId::new(5).unwrap());
        let repos = source.org_public_repos(&org).await.unwrap();
        assert_eq!(ids(&repos), vec!["a1"]);

        let personal = source.org_public_repos(&Scope::Personal).await.unwrap();
        assert!(personal.is_empty());
    }

    #[tokio::test]
    async fn corrupted_repos_only_come_from_owned() {
        let temp = TempDir::new().unwrap();
        let source = FileSource::new(temp.path());
        let store = source.store();

        let mut broken = stored("a1", "Broken", "bob", None);
        broken.record.corrupted = true;
        broken.public = true;
        store.add_repo(&broken).unwrap();

        let alice = user("alice");
        let id = RepoId::new("a1").unwrap();
        store.share_with_user(&id, &alice).unwrap();
        let group = store.create_group("eng", &[alice.clone()]).unwrap();
        store.share_with_group(&id, group).unwrap();

        let shared = source
            .shared_in_repos(&alice, &Scope::Personal, Page::all())
            .await
            .unwrap();
        assert!(shared.is_empty());
        assert!(source.group_repos(&alice).await.unwrap().is_empty());
        assert!(source.org_public_repos(&Scope::Personal).await.unwrap().is_empty());

        let owned = source
            .owned_repos(&user("bob"), &Scope::Personal, true)
            .await
            .unwrap();
        assert_eq!(ids(&owned), vec!["a1"]);
    }

    #[test]
    fn from_url_requires_file_scheme() {
        let url = SourceUrl::new("https://repos.example.com").unwrap();
        assert!(FileSource::from_url(&url).is_err());

        let temp = TempDir::new().unwrap();
        let url = SourceUrl::from_directory(temp.path()).unwrap();
        let source = FileSource::from_url(&url).unwrap();
        assert_eq!(source.store().root(), temp.path());
    }
}
