//! JSON:API HTTP surface.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpServerConfig;
use crate::error::{HierarchyError, Result};
use crate::service::{HierarchyService, TraversalRequest};

pub const JSON_API: &str = "application/vnd.api+json";

/// HTTP wrapper around a `HierarchyService`
pub struct HttpServer {
    service: Arc<HierarchyService>,
    allowed_origins: Vec<String>,
}

impl HttpServer {
    pub fn new(service: Arc<HierarchyService>, config: &HttpServerConfig) -> Self {
        Self {
            service,
            allowed_origins: config.allowed_origins.clone(),
        }
    }

    /// Run the HTTP server on all interfaces
    pub async fn run(&self, port: u16) -> Result<()> {
        let app = self.router();

        let addr = format!("0.0.0.0:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            HierarchyError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", addr, e),
            ))
        })?;
        log::info!("Hierarchy service listening on http://{}", addr);

        axum::serve(listener, app).await.map_err(|e| {
            HierarchyError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e),
            ))
        })?;

        Ok(())
    }

    pub fn router(&self) -> Router {
        // no origins configured means any origin
        let cors = if self.allowed_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<axum::http::HeaderValue> = self
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .route("/hierarchies/:id/target/:concept", get(handle_descendants))
            .route("/hierarchies/:id/ancestors/:concept", get(handle_ancestors))
            .route("/hierarchies/cache/clear", post(handle_cache_clear))
            .route("/hierarchies/cache/size", get(handle_cache_size))
            .route("/hierarchies/filters/reload", post(handle_filters_reload))
            .route("/health", get(handle_health))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .with_state(Arc::clone(&self.service))
    }
}

type AppState = Arc<HierarchyService>;

/// Store faults and other failures, reported without detail.
struct ApiError(HierarchyError);

impl From<HierarchyError> for ApiError {
    fn from(err: HierarchyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::error!("Request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, JSON_API)],
            Json(json!({
                "errors": [{ "status": "500", "title": "Internal server error" }]
            })),
        )
            .into_response()
    }
}

fn json_api(body: serde_json::Value) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, JSON_API)], Json(body)).into_response()
}

async fn handle_descendants(
    State(service): State<AppState>,
    Path((hierarchy_id, concept_id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> std::result::Result<Response, ApiError> {
    let request = TraversalRequest::from_query(hierarchy_id, concept_id, &query);
    let data = service.fetch_descendants(&request).await?;
    Ok(json_api(json!({ "data": data })))
}

async fn handle_ancestors(
    State(service): State<AppState>,
    Path((hierarchy_id, concept_id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> std::result::Result<Response, ApiError> {
    let request = TraversalRequest::from_query(hierarchy_id, concept_id, &query);
    let data = service.fetch_ancestors(&request).await?;
    Ok(json_api(json!({ "data": data })))
}

async fn handle_cache_clear(State(service): State<AppState>) -> Response {
    service.clear_cache();
    json_api(json!({ "status": "ok" }))
}

async fn handle_cache_size(State(service): State<AppState>) -> Response {
    json_api(json!({ "size": service.cache_size() }))
}

async fn handle_filters_reload(
    State(service): State<AppState>,
) -> std::result::Result<Response, ApiError> {
    let count = service.reload_filters().await?;
    Ok(json_api(json!({ "status": "ok", "filters": count })))
}

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "hierarchy",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
        .into_response()
}
