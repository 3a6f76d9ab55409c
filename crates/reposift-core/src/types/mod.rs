//! Identity and location types.
//!
//! These types enforce their invariants at construction time, so a search
//! never runs with a malformed viewer, repository id or source location.

mod repo_id;
mod scope;
mod source_url;
mod username;

pub use repo_id::RepoId;
pub use scope::{GroupId, OrgId, Scope};
pub use source_url::SourceUrl;
pub use username::Username;
