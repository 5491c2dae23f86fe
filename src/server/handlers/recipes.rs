// src/server/handlers/recipes.rs
//! Public recipe API: search, download and upstream passthrough

use crate::recipe::RecipeId;
use crate::server::handlers::archive_response;
use crate::server::{ApiError, ServerState};
use crate::validation::Validator;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub needle: Option<String>,
}

/// GET /v1/recipes/search?needle=
pub async fn search(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let mut v = Validator::new();
    let needle = v.required("needle", query.needle.as_deref());
    let Some(needle) = needle else {
        return Err(ApiError::validation(
            "Please provide a needle",
            v.finish().err().unwrap_or_default(),
        ));
    };

    Ok(Json(state.search.search(needle).await?))
}

/// GET /v1/recipes/download/:recipe
///
/// Serves the published archive, or redirects to the upstream when this
/// server does not have it.
pub async fn download(
    State(state): State<Arc<ServerState>>,
    Path(recipe): Path<String>,
) -> Result<Response, ApiError> {
    let id = RecipeId::parse(&recipe)?;

    match state.store.open(&id, false).await? {
        Some(archive) => Ok(archive_response(archive)),
        None => {
            let location = state.upstream.download_url(&id);
            debug!("Recipe {} not local, redirecting to {}", id, location);
            Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
        }
    }
}

/// ANY /v1/*
pub async fn passthrough(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let location = state.upstream.passthrough_url(path_and_query);
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
}
