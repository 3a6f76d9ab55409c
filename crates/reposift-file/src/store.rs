//! Filesystem storage for the repository catalog.
//!
//! Layout under the catalog root:
//!
//! ```text
//! repos/<repo-id>.json     one StoredRepo per repository
//! shares/<username>.json   repositories shared directly with a user
//! groups/<group-id>.json   group name, members and shared repositories
//! catalog.lock             advisory lock held by writers
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use reposift_core::Result;
use reposift_core::error::{DependencyError, Error, InvalidInputError};
use reposift_core::repo::RepositoryRecord;
use reposift_core::types::{GroupId, OrgId, RepoId, Username};

fn map_io(err: std::io::Error) -> Error {
    Error::Dependency(DependencyError::Storage {
        message: format!("IO error: {}", err),
    })
}

fn map_json(err: serde_json::Error) -> Error {
    Error::Dependency(DependencyError::Storage {
        message: format!("JSON error: {}", err),
    })
}

fn not_found(what: &str, id: impl std::fmt::Display) -> Error {
    Error::InvalidInput(InvalidInputError::Other {
        message: format!("{} {} not found", what, id),
    })
}

/// A repository as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRepo {
    /// The listing record.
    #[serde(flatten)]
    pub record: RepositoryRecord,
    /// The owning account.
    pub owner: Username,
    /// Owning organization; `None` for personal repositories.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<OrgId>,
    /// Whether the repository is published to everyone in its scope.
    #[serde(default)]
    pub public: bool,
}

/// Repositories shared directly with one user, in share order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ShareList {
    pub repos: Vec<RepoId>,
}

/// A group of users with repositories shared to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<Username>,
    #[serde(default)]
    pub repos: Vec<RepoId>,
}

/// Filesystem-backed repository catalog.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a new file store at the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repos_dir(&self) -> PathBuf {
        self.root.join("repos")
    }

    fn shares_dir(&self) -> PathBuf {
        self.root.join("shares")
    }

    fn groups_dir(&self) -> PathBuf {
        self.root.join("groups")
    }

    /// File holding repository `id`. Ids that cannot name a file inside
    /// `repos/` are rejected.
    fn repo_path(&self, id: &RepoId) -> Result<PathBuf> {
        let name = id.as_str();
        if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
            return Err(Error::InvalidInput(InvalidInputError::RepoId {
                value: name.to_string(),
                reason: "cannot be stored as a catalog file name".to_string(),
            }));
        }
        Ok(self.repos_dir().join(format!("{}.json", name)))
    }

    fn share_path(&self, user: &Username) -> PathBuf {
        self.shares_dir().join(format!("{}.json", user))
    }

    fn group_path(&self, id: GroupId) -> PathBuf {
        self.groups_dir().join(format!("{}.json", id))
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join("catalog.lock")
    }

    /// Run `f` while holding the exclusive catalog lock.
    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        fs::create_dir_all(&self.root).map_err(map_io)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(map_io)?;

        lock_file.lock_exclusive().map_err(map_io)?;
        let result = f();
        lock_file.unlock().map_err(map_io)?;

        result
    }

    /// Write a JSON document via a temp file and rename.
    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let content = serde_json::to_string_pretty(value).map_err(map_json)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).map_err(map_io)?;
        fs::rename(&temp_path, path).map_err(map_io)?;

        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(path).map_err(map_io)?;
        let value = serde_json::from_slice(&bytes).map_err(map_json)?;
        Ok(Some(value))
    }

    /// List `*.json` files of a directory, ordered by file name.
    fn json_entries(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(map_io)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();

        entries.sort();
        Ok(entries)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Read and parse one catalog entry.
    ///
    /// An entry that cannot be read or decoded is skipped with a warning.
    fn load_entry<T: DeserializeOwned>(path: &Path, what: &str) -> Option<T> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable {}", what);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping malformed {}", what);
                None
            }
        }
    }

    /// Load one repository.
    ///
    /// Returns `None` if the repository does not exist or its file is
    /// malformed.
    pub fn get_repo(&self, id: &RepoId) -> Result<Option<StoredRepo>> {
        let Ok(path) = self.repo_path(id) else {
            debug!(%id, "Repository id has no catalog file");
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Ok(Self::load_entry(&path, "repository"))
    }

    /// Load every repository, ordered by id. Malformed files are skipped.
    pub fn list_repos(&self) -> Result<Vec<StoredRepo>> {
        let mut repos = Vec::new();
        for path in Self::json_entries(&self.repos_dir())? {
            repos.extend(Self::load_entry::<StoredRepo>(&path, "repository"));
        }
        Ok(repos)
    }

    /// Ids of repositories shared directly with `user`, in share order.
    pub fn shares_for(&self, user: &Username) -> Result<Vec<RepoId>> {
        let list: Option<ShareList> = self.read_json(&self.share_path(user))?;
        Ok(list.map(|l| l.repos).unwrap_or_default())
    }

    /// Load one group.
    pub fn get_group(&self, id: GroupId) -> Result<Option<StoredGroup>> {
        self.read_json(&self.group_path(id))
    }

    /// Load every group, ordered by id. Malformed files are skipped.
    pub fn list_groups(&self) -> Result<Vec<StoredGroup>> {
        let mut groups = Vec::new();

        for path in Self::json_entries(&self.groups_dir())? {
            groups.extend(Self::load_entry::<StoredGroup>(&path, "group"));
        }

        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    /// Groups that list `user` as a member, ordered by id.
    pub fn groups_of(&self, user: &Username) -> Result<Vec<StoredGroup>> {
        Ok(self
            .list_groups()?
            .into_iter()
            .filter(|g| g.members.contains(user))
            .collect())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Generate a fresh repository id.
    pub fn generate_repo_id() -> Result<RepoId> {
        RepoId::new(Uuid::new_v4().to_string())
    }

    /// Create a repository owned by `owner` and return its record.
    #[instrument(skip(self))]
    pub fn create_repo(
        &self,
        owner: &Username,
        name: &str,
        org_id: Option<OrgId>,
    ) -> Result<StoredRepo> {
        let mut record = RepositoryRecord::new(Self::generate_repo_id()?, name);
        record.last_modified = Utc::now().timestamp();
        record.version = 1;

        let repo = StoredRepo {
            record,
            owner: owner.clone(),
            org_id,
            public: false,
        };

        self.add_repo(&repo)?;
        Ok(repo)
    }

    /// Insert or replace a repository.
    #[instrument(skip(self, repo), fields(id = %repo.record.id))]
    pub fn add_repo(&self, repo: &StoredRepo) -> Result<()> {
        let path = self.repo_path(&repo.record.id)?;
        self.with_lock(|| self.write_json(&path, repo))?;
        debug!(owner = %repo.owner, "Stored repository");
        Ok(())
    }

    /// Share a repository directly with a user. Sharing twice is a no-op.
    #[instrument(skip(self))]
    pub fn share_with_user(&self, repo: &RepoId, user: &Username) -> Result<()> {
        self.with_lock(|| {
            if !self.repo_path(repo)?.exists() {
                return Err(not_found("repository", repo));
            }

            let path = self.share_path(user);
            let mut list: ShareList = self.read_json(&path)?.unwrap_or_default();
            if !list.repos.contains(repo) {
                list.repos.push(repo.clone());
                self.write_json(&path, &list)?;
            }
            Ok(())
        })?;

        debug!("Shared repository with user");
        Ok(())
    }

    /// Create a group and return its id.
    #[instrument(skip(self))]
    pub fn create_group(&self, name: &str, members: &[Username]) -> Result<GroupId> {
        let id = self.with_lock(|| {
            let next = self
                .list_groups()?
                .last()
                .map(|g| g.id.get() + 1)
                .unwrap_or(1);
            let id = GroupId::new(next)?;

            let mut unique: Vec<Username> = Vec::with_capacity(members.len());
            for member in members {
                if !unique.contains(member) {
                    unique.push(member.clone());
                }
            }

            let group = StoredGroup {
                id,
                name: name.to_string(),
                members: unique,
                repos: Vec::new(),
            };
            self.write_json(&self.group_path(id), &group)?;
            Ok(id)
        })?;

        debug!(%id, "Created group");
        Ok(id)
    }

    /// Add a member to a group. Adding twice is a no-op.
    #[instrument(skip(self))]
    pub fn add_group_member(&self, group: GroupId, user: &Username) -> Result<()> {
        self.update_group(group, |g| {
            if !g.members.contains(user) {
                g.members.push(user.clone());
            }
        })
    }

    /// Share a repository with a group. Sharing twice is a no-op.
    #[instrument(skip(self))]
    pub fn share_with_group(&self, repo: &RepoId, group: GroupId) -> Result<()> {
        if !self.repo_path(repo)?.exists() {
            return Err(not_found("repository", repo));
        }

        self.update_group(group, |g| {
            if !g.repos.contains(repo) {
                g.repos.push(repo.clone());
            }
        })
    }

    fn update_group(&self, id: GroupId, f: impl FnOnce(&mut StoredGroup)) -> Result<()> {
        self.with_lock(|| {
            let path = self.group_path(id);
            let mut group: StoredGroup = self
                .read_json(&path)?
                .ok_or_else(|| not_found("group", id))?;
            f(&mut group);
            self.write_json(&path, &group)
        })
    }

    /// Publish or unpublish a repository to its organization.
    #[instrument(skip(self))]
    pub fn set_public(&self, repo: &RepoId, public: bool) -> Result<()> {
        self.with_lock(|| {
            let path = self.repo_path(repo)?;
            let mut stored: StoredRepo = self
                .read_json(&path)?
                .ok_or_else(|| not_found("repository", repo))?;
            stored.public = public;
            self.write_json(&path, &stored)
        })
    }
}
