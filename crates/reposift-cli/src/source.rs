//! Source selection shared by the search and serve commands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use directories::ProjectDirs;

use reposift_core::format::parse_time_zone;
use reposift_core::repo::RepositoryRecord;
use reposift_core::traits::{Page, RepoSource};
use reposift_core::types::{Scope, SourceUrl, Username};
use reposift_core::SearchConfig;
use reposift_file::FileSource;
use reposift_http::HttpSource;

/// Flags selecting the repository source and search tuning.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Catalog or listing service URL (file:// or https://)
    #[arg(long, env = "REPOSIFT_SOURCE")]
    pub source: Option<String>,

    /// Bearer token for a listing service
    #[arg(long, env = "REPOSIFT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-source timeout in seconds (0 disables the limit)
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// IANA time zone used to render modification times
    #[arg(long, default_value = "UTC")]
    pub time_zone: String,
}

impl SourceArgs {
    /// Open the configured source.
    pub fn open(&self) -> Result<CliSource> {
        let url = match &self.source {
            Some(s) => SourceUrl::new(s).context("Invalid source URL")?,
            None => SourceUrl::from_directory(default_catalog_dir()?)
                .context("Invalid default catalog path")?,
        };
        CliSource::open(url, self.token.as_deref())
    }

    /// Build the search configuration from the flags.
    pub fn search_config(&self) -> Result<SearchConfig> {
        let time_zone = parse_time_zone(&self.time_zone).context("Invalid time zone")?;
        let source_timeout = (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));

        Ok(SearchConfig {
            source_timeout,
            time_zone,
        })
    }
}

/// Default catalog location under the platform data directory.
pub fn default_catalog_dir() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "reposift").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("catalog"))
}

/// A repository source chosen at runtime.
#[derive(Debug, Clone)]
pub enum CliSource {
    File(FileSource),
    Http(HttpSource),
}

impl CliSource {
    /// Open a source for `url`; `token` only applies to listing services.
    pub fn open(url: SourceUrl, token: Option<&str>) -> Result<Self> {
        if url.is_local() {
            let source = FileSource::from_url(&url).context("Invalid catalog URL")?;
            return Ok(CliSource::File(source));
        }

        let mut source = HttpSource::new(url).context("Failed to create HTTP source")?;
        if let Some(token) = token {
            source = source.with_token(token);
        }
        Ok(CliSource::Http(source))
    }

    /// Describe the source for log output.
    pub fn describe(&self) -> String {
        match self {
            CliSource::File(source) => format!("file catalog {}", source.store().root().display()),
            CliSource::Http(source) => format!("listing service {}", source.url()),
        }
    }
}

#[async_trait]
impl RepoSource for CliSource {
    async fn owned_repos(
        &self,
        viewer: &Username,
        scope: &Scope,
        include_corrupted: bool,
    ) -> reposift_core::Result<Vec<RepositoryRecord>> {
        match self {
            CliSource::File(s) => s.owned_repos(viewer, scope, include_corrupted).await,
            CliSource::Http(s) => s.owned_repos(viewer, scope, include_corrupted).await,
        }
    }

    async fn shared_in_repos(
        &self,
        viewer: &Username,
        scope: &Scope,
        page: Page,
    ) -> reposift_core::Result<Vec<RepositoryRecord>> {
        match self {
            CliSource::File(s) => s.shared_in_repos(viewer, scope, page).await,
            CliSource::Http(s) => s.shared_in_repos(viewer, scope, page).await,
        }
    }

    async fn group_repos(&self, viewer: &Username) -> reposift_core::Result<Vec<RepositoryRecord>> {
        match self {
            CliSource::File(s) => s.group_repos(viewer).await,
            CliSource::Http(s) => s.group_repos(viewer).await,
        }
    }

    async fn org_public_repos(&self, scope: &Scope) -> reposift_core::Result<Vec<RepositoryRecord>> {
        match self {
            CliSource::File(s) => s.org_public_repos(scope).await,
            CliSource::Http(s) => s.org_public_repos(scope).await,
        }
    }
}
