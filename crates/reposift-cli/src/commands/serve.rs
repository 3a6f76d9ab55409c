//! HTTP server exposing the repository search.
//!
//! # Endpoints
//!
//! | Method | Path                | Description                         |
//! |--------|---------------------|-------------------------------------|
//! | GET    | `/api2/search-repo/` | Search repositories visible to user |
//! | GET    | `/health`           | Liveness and version                |
//!
//! The server trusts an authenticating proxy in front of it to set the
//! viewer headers:
//!
//! - `X-Reposift-User`: account name (required)
//! - `X-Reposift-Org`: organization id of the account
//! - `X-Reposift-Can-View-Org`: `true` or `1` to include org-public repositories

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use reposift_core::error::{DependencyError, Error};
use reposift_core::types::{OrgId, Scope, Username};
use reposift_core::{RepoSource, SearchConfig, SearchRequest, SearchResponse, search};

use crate::source::SourceArgs;

pub const USER_HEADER: &str = "x-reposift-user";
pub const ORG_HEADER: &str = "x-reposift-org";
pub const CAN_VIEW_ORG_HEADER: &str = "x-reposift-can-view-org";

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub bind: String,

    #[command(flatten)]
    pub source: SourceArgs,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.source.search_config()?;
    let source = args.source.open()?;
    info!(source = %source.describe(), "Using repository source");

    let app = router(AppState::new(source, config));

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Shared state of the server.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn RepoSource>,
    config: Arc<SearchConfig>,
}

impl AppState {
    pub fn new(source: impl RepoSource + 'static, config: SearchConfig) -> Self {
        Self {
            source: Arc::new(source),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api2/search-repo/", get(handle_search))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Errors ============

#[derive(Serialize)]
struct ErrorBody {
    error_msg: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_msg: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidQuery(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Dependency(DependencyError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Error::Dependency(_) => StatusCode::BAD_GATEWAY,
        };

        match err {
            Error::InvalidQuery(e) => AppError::new(status, e.to_string()),
            other => {
                if other.is_dependency_failure() {
                    warn!(error = %other, "Search failed");
                }
                AppError::new(status, other.to_string())
            }
        }
    }
}

// ============ GET /api2/search-repo/ ============

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// The viewer described by the proxy headers.
struct Viewer {
    user: Username,
    scope: Scope,
    can_view_org: bool,
}

impl Viewer {
    fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let user = header(USER_HEADER)
            .ok_or_else(|| AppError::new(StatusCode::UNAUTHORIZED, "Authentication required"))?;
        let user = Username::new(user)
            .map_err(|e| AppError::new(StatusCode::UNAUTHORIZED, e.to_string()))?;

        let org = match header(ORG_HEADER) {
            Some(raw) => Some(
                raw.parse::<OrgId>()
                    .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, e.to_string()))?,
            ),
            None => None,
        };

        let can_view_org = header(CAN_VIEW_ORG_HEADER)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        Ok(Self {
            user,
            scope: Scope::from_org(org),
            can_view_org,
        })
    }
}

async fn handle_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let viewer = Viewer::from_headers(&headers)?;
    let Query(params) =
        params.map_err(|e| AppError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

    let request = SearchRequest {
        viewer: &viewer.user,
        scope: viewer.scope,
        can_view_org: viewer.can_view_org,
        query: &params.q,
    };

    let response = search(state.source.as_ref(), &request, &state.config).await?;
    Ok(Json(response))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("REPOSIFT_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use reposift_core::error::ProtocolError;
    use reposift_core::repo::RepositoryRecord;
    use reposift_core::traits::Page;
    use reposift_core::types::RepoId;
    use reposift_file::{FileSource, StoredRepo};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    enum Broken {
        Failing,
        Hanging,
    }

    #[async_trait]
    impl RepoSource for Broken {
        async fn owned_repos(
            &self,
            _viewer: &Username,
            _scope: &Scope,
            _include_corrupted: bool,
        ) -> reposift_core::Result<Vec<RepositoryRecord>> {
            match self {
                Broken::Failing => Err(ProtocolError::new(500, None, None).into()),
                Broken::Hanging => std::future::pending().await,
            }
        }

        async fn shared_in_repos(
            &self,
            _viewer: &Username,
            _scope: &Scope,
            _page: Page,
        ) -> reposift_core::Result<Vec<RepositoryRecord>> {
            Ok(Vec::new())
        }

        async fn group_repos(
            &self,
            _viewer: &Username,
        ) -> reposift_core::Result<Vec<RepositoryRecord>> {
            Ok(Vec::new())
        }

        async fn org_public_repos(
            &self,
            _scope: &Scope,
        ) -> reposift_core::Result<Vec<RepositoryRecord>> {
            Ok(Vec::new())
        }
    }

    fn catalog() -> (TempDir, Router) {
        let temp = TempDir::new().unwrap();
        let source = FileSource::new(temp.path());
        let store = source.store();

        let repos = [
            ("a1", "Project Notes", "alice", 100, None, false),
            ("b2", "Photos", "alice", 200, None, false),
            ("c3", "Org Project", "bob", 300, Some(4), true),
        ];
        for (id, name, owner, mtime, org, public) in repos {
            let mut record = RepositoryRecord::new(RepoId::new(id).unwrap(), name);
            record.last_modified = mtime;
            store
                .add_repo(&StoredRepo {
                    record,
                    owner: Username::new(owner).unwrap(),
                    org_id: org.map(|o| OrgId::new(o).unwrap()),
                    public,
                })
                .unwrap();
        }

        let app = router(AppState::new(source, SearchConfig::default()));
        (temp, app)
    }

    fn search_request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn decode_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn search_returns_matches() {
        let (_temp, app) = catalog();

        let response = app
            .oneshot(search_request(
                "/api2/search-repo/?q=project",
                &[(USER_HEADER, "alice")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = decode_json(response).await;
        let repos = payload["repos"].as_array().unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0]["id"], "a1");
        assert_eq!(repos[0]["permission"], "rw");
        assert_eq!(repos[0]["virtual"], false);
        assert_eq!(repos[0]["mtime_relative"], "1970-01-01T00:01:40+00:00");
    }

    #[tokio::test]
    async fn org_headers_widen_the_search() {
        let (_temp, app) = catalog();

        let response = app
            .oneshot(search_request(
                "/api2/search-repo/?q=PROJECT",
                &[
                    (USER_HEADER, "alice"),
                    (ORG_HEADER, "4"),
                    (CAN_VIEW_ORG_HEADER, "true"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = decode_json(response).await;
        let ids: Vec<&str> = payload["repos"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["c3"]);
    }

    #[tokio::test]
    async fn empty_query_is_bad_request() {
        let (_temp, app) = catalog();

        for uri in ["/api2/search-repo/?q=", "/api2/search-repo/"] {
            let response = app
                .clone()
                .oneshot(search_request(uri, &[(USER_HEADER, "alice")]))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let payload = decode_json(response).await;
            assert_eq!(payload["error_msg"], "keywords can not be empty");
        }
    }

    #[tokio::test]
    async fn undecodable_query_has_json_error() {
        let (_temp, app) = catalog();

        let response = app
            .oneshot(search_request(
                "/api2/search-repo/?q=notes&q=photos",
                &[(USER_HEADER, "alice")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = decode_json(response).await;
        assert!(payload["error_msg"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let (_temp, app) = catalog();

        let response = app
            .oneshot(search_request("/api2/search-repo/?q=notes", &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_org_is_bad_request() {
        let (_temp, app) = catalog();

        let response = app
            .oneshot(search_request(
                "/api2/search-repo/?q=notes",
                &[(USER_HEADER, "alice"), (ORG_HEADER, "zero")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failing_source_is_bad_gateway() {
        let app = router(AppState::new(Broken::Failing, SearchConfig::default()));

        let response = app
            .oneshot(search_request(
                "/api2/search-repo/?q=notes",
                &[(USER_HEADER, "alice")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let payload = decode_json(response).await;
        assert!(payload["error_msg"].as_str().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn hanging_source_is_gateway_timeout() {
        let config = SearchConfig {
            source_timeout: Some(Duration::from_millis(20)),
            ..SearchConfig::default()
        };
        let app = router(AppState::new(Broken::Hanging, config));

        let response = app
            .oneshot(search_request(
                "/api2/search-repo/?q=notes",
                &[(USER_HEADER, "alice")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (_temp, app) = catalog();

        let response = app
            .oneshot(search_request("/health", &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let payload = decode_json(response).await;
        assert_eq!(payload["status"], "ok");
        assert!(payload["version"].as_str().is_some_and(|v| !v.is_empty()));
    }
}
