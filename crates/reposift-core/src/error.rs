//! Error types for reposift.
//!
//! A single [`Error`] type with explicit variants for query validation,
//! failures of the repository sources the search depends on, and invalid
//! identifiers.

use std::fmt;
use thiserror::Error;

use crate::traits::SourceKind;

/// The unified error type for reposift operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The search query was rejected before any source was contacted.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] InvalidQueryError),

    /// A repository source failed; the whole query fails with it.
    #[error("dependency failure: {0}")]
    Dependency(#[from] DependencyError),

    /// Input validation errors (invalid username, repo id, URL).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if this error came from a repository source.
    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, Error::Dependency(_))
    }
}

/// Query validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidQueryError {
    /// The keyword string was empty.
    #[error("keywords can not be empty")]
    Empty,
}

/// Failures of a repository source.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// Connection to the source could not be established.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// A source call exceeded its time budget.
    #[error("{provider} source timed out after {duration_ms}ms")]
    Timeout {
        provider: SourceKind,
        duration_ms: u64,
    },

    /// Generic HTTP transport error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// Local storage could not be read or written.
    #[error("storage error: {message}")]
    Storage { message: String },

    /// The source answered with an error response.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// An error response returned by a remote listing service.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Dependency(DependencyError::Protocol(err))
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid username.
    #[error("invalid username '{value}': {reason}")]
    Username { value: String, reason: String },

    /// Invalid repository id.
    #[error("invalid repo id '{value}': {reason}")]
    RepoId { value: String, reason: String },

    /// Invalid organization id.
    #[error("invalid org id '{value}': {reason}")]
    OrgId { value: String, reason: String },

    /// Invalid group id.
    #[error("invalid group id '{value}': {reason}")]
    GroupId { value: String, reason: String },

    /// Invalid source URL.
    #[error("invalid source URL '{value}': {reason}")]
    SourceUrl { value: String, reason: String },

    /// Unknown time zone name.
    #[error("invalid time zone '{value}': {reason}")]
    TimeZone { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
