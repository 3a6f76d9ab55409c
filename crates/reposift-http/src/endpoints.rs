//! Listing service endpoints and wire types.

use serde::{Deserialize, Serialize};

/// Repositories owned by a user.
pub const OWNED_REPOS: &str = "/api/v1/repos/owned";

/// Repositories shared directly with a user.
pub const SHARED_IN_REPOS: &str = "/api/v1/repos/shared-in";

/// Repositories shared with the groups of a user.
pub const GROUP_REPOS: &str = "/api/v1/repos/group";

/// Repositories published to an organization.
pub const PUBLIC_REPOS: &str = "/api/v1/repos/public";

#[derive(Debug, Serialize)]
pub(crate) struct OwnedQuery<'a> {
    pub user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    pub include_corrupted: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SharedInQuery<'a> {
    pub user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupQuery<'a> {
    pub user: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct PublicQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
}

/// Body of every listing response.
///
/// Entries stay untyped so one bad record does not reject the listing. The
/// `repos` array itself is required.
#[derive(Debug, Deserialize)]
pub(crate) struct ListingResponse {
    pub repos: Vec<serde_json::Value>,
}

/// Error body returned by the listing service.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: Option<String>,
    #[serde(alias = "error_msg")]
    pub message: Option<String>,
}
