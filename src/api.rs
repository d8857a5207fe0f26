//! HTTP API Server for the Movie Feed
//!
//! Provides REST endpoints for clients to fetch personalized feeds.

use axum::http::HeaderValue;
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ApiConfig;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::feed::{FeedEngine, Movie, PgFeedStore};

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub engine: FeedEngine,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Start the API server
pub async fn start_server(db: Database, config: &ApiConfig) -> Result<()> {
    let store = Arc::new(PgFeedStore::new(db.pool().clone()));
    let engine = FeedEngine::new(store);

    let state = Arc::new(AppState { db, engine });

    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Personalized feed
        .route("/feed/:user_id", get(get_feed))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.request_timeout))
        .with_state(state);

    let app = if config.cors_enabled {
        app.layer(cors_layer(&config.cors_origins))
    } else {
        app
    };

    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Starting feed API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::internal(e))?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>> {
    state.db.health_check().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Get the personalized feed for a user
///
/// Returns the ranked movies as a JSON array, at most 10 items. Unknown
/// user ids are served a recency-only feed; storage failures surface as an
/// opaque internal error.
async fn get_feed(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Movie>>> {
    match state.engine.rank(&user_id).await {
        Ok(movies) => Ok(Json(movies)),
        Err(e) => {
            error!("Failed to rank feed for {}: {:?}", user_id, e);
            Err(e)
        }
    }
}
