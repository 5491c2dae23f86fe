// src/server/handlers/site.rs
//! Health check, landing banner and static redirects

use crate::db;
use crate::runtime;
use crate::server::{ApiError, ServerState};
use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use std::sync::Arc;

/// GET /health
pub async fn health(State(state): State<Arc<ServerState>>) -> Response {
    let db_path = state.registry.path().to_path_buf();
    match runtime::blocking(move || db::ping(&db_path)).await {
        Ok(()) => Json(json!({"api": "success", "db": "success"})).into_response(),
        Err(e) => {
            tracing::warn!("Health check database probe failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"api": "success", "db": "failure"})),
            )
                .into_response()
        }
    }
}

/// GET /
pub async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "name": "larder",
        "version": env!("CARGO_PKG_VERSION"),
        "search": "/v1/recipes/search?needle=",
        "submit": ["/new", "/github"],
    }))
}

/// GET /terms
pub async fn terms() -> Redirect {
    Redirect::temporary("/terms.html")
}

/// GET /privacy
pub async fn privacy() -> Redirect {
    Redirect::temporary("/privacy.html")
}

/// Unknown GETs go back to the landing page
pub async fn fallback(method: Method) -> Response {
    if method == Method::GET || method == Method::HEAD {
        Redirect::to("/").into_response()
    } else {
        ApiError::new(StatusCode::NOT_FOUND, "Not found").into_response()
    }
}
