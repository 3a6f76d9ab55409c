//! Collaborator traits.

mod source;

pub use source::{Page, RepoSource, SourceKind};
