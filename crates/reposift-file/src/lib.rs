//! reposift-file - Filesystem-backed repository catalog.

mod source;
mod store;

pub use source::FileSource;
pub use store::{FileStore, StoredGroup, StoredRepo};
