//! Repository records.
//!
//! [`RepositoryRecord`] is what sources list; [`SearchResultRecord`] is what
//! a search returns.

mod types;

pub use types::{Permission, RepositoryRecord, SearchResponse, SearchResultRecord};
