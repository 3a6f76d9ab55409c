//! reposift-core - Repository search types, source trait and aggregator.

pub mod error;
pub mod format;
pub mod repo;
pub mod search;
pub mod traits;
pub mod types;

pub use error::Error;
pub use repo::{Permission, RepositoryRecord, SearchResponse, SearchResultRecord};
pub use search::{SearchConfig, SearchRequest, search};
pub use traits::{Page, RepoSource, SourceKind};
pub use types::{GroupId, OrgId, RepoId, Scope, SourceUrl, Username};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
