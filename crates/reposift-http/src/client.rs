//! HTTP client for the listing service.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use reposift_core::Result;
use reposift_core::error::{DependencyError, Error, ProtocolError};
use reposift_core::traits::SourceKind;
use reposift_core::types::SourceUrl;

use crate::endpoints::ErrorResponse;

/// Convert a transport failure of a `kind` call into a dependency error.
/// Client-side timeouts are HTTP failures; `DependencyError::Timeout` is
/// reserved for the search budget.
pub(crate) fn map_reqwest(err: reqwest::Error, kind: SourceKind) -> Error {
    let dependency = if err.is_timeout() {
        DependencyError::Http {
            message: format!("{} request timed out: {}", kind, err),
        }
    } else if err.is_connect() {
        DependencyError::Connection {
            message: err.to_string(),
        }
    } else {
        DependencyError::Http {
            message: err.to_string(),
        }
    };
    Error::Dependency(dependency)
}

/// HTTP client bound to one listing service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: SourceUrl,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for the service at `base`.
    pub fn new(base: SourceUrl) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("reposift/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                Error::Dependency(DependencyError::Http {
                    message: format!("failed to build HTTP client: {}", e),
                })
            })?;

        Ok(Self {
            client,
            base,
            token: None,
        })
    }

    /// Send `token` as a bearer credential on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Returns the service URL this client is configured for.
    pub fn base(&self) -> &SourceUrl {
        &self.base
    }

    /// Issue a GET request and decode the JSON body.
    #[instrument(skip(self, params), fields(base = %self.base))]
    pub async fn get<Q, R>(&self, kind: SourceKind, path: &str, params: &Q) -> Result<R>
    where
        Q: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.base.api_url(path);
        debug!(%kind, path, "Listing request");
        trace!(?params, "query parameters");

        let mut request = self.client.get(&url).query(params);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| map_reqwest(e, kind))?;
        self.handle_response(response, kind).await
    }

    async fn handle_response<R: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        kind: SourceKind,
    ) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "Listing response");

        if !status.is_success() {
            return Err(self.parse_error_response(response).await.into());
        }

        let body = response.text().await.map_err(|e| map_reqwest(e, kind))?;
        serde_json::from_str(&body).map_err(|e| {
            Error::Dependency(DependencyError::Http {
                message: format!("invalid {} response: {}", kind, e),
            })
        })
    }

    async fn parse_error_response(&self, response: reqwest::Response) -> ProtocolError {
        let status = response.status().as_u16();

        match response.json::<ErrorResponse>().await {
            Ok(body) => ProtocolError::new(status, body.error, body.message),
            Err(_) => ProtocolError::new(status, None, None),
        }
    }
}
