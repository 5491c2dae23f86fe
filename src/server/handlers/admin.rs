// src/server/handlers/admin.rs
//! Admin endpoints: accounts, review dashboard and lifecycle actions

use crate::accounts::{LoginForm, RegisterForm};
use crate::db::models::Recipe;
use crate::error::Error;
use crate::recipe::RecipeId;
use crate::runtime;
use crate::server::handlers::archive_response;
use crate::server::{AdminSession, ApiError, Notice, ServerState};
use crate::store::archive;
use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub username: Option<String>,
    pub token: String,
}

/// A pending recipe as shown on the dashboard
#[derive(Debug, Serialize)]
pub struct PendingRecipe {
    pub id: String,
    pub name: String,
    pub data: Value,
    /// Files inside the submitted archive
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub user: String,
    pub recipes: Vec<PendingRecipe>,
}

/// POST /admin/register
pub async fn register(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<RegisterForm>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let accounts = state.accounts.clone();
    let (user, session) = runtime::blocking(move || accounts.register(&form)).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            username: Some(user.username),
            token: session.token,
        }),
    ))
}

/// POST /admin/login
pub async fn login(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<SessionResponse>, ApiError> {
    let identifier = form.identifier.clone().unwrap_or_default();
    if state.login_throttle.is_locked(&identifier).await {
        return Err(Error::LockedOut(identifier).into());
    }

    let accounts = state.accounts.clone();
    match runtime::blocking(move || accounts.login(&form)).await {
        Ok(session) => {
            state.login_throttle.record_success(&identifier).await;
            Ok(Json(SessionResponse {
                username: None,
                token: session.token,
            }))
        }
        Err(Error::InvalidCredentials) => {
            if !identifier.is_empty() {
                state.login_throttle.record_failure(&identifier).await;
            }
            Err(Error::InvalidCredentials.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /admin/logout
pub async fn logout(
    State(state): State<Arc<ServerState>>,
    session: AdminSession,
) -> Result<Notice, ApiError> {
    let accounts = state.accounts.clone();
    runtime::blocking(move || accounts.logout(&session.token)).await?;
    Ok(Notice::success("Logged out"))
}

/// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<ServerState>>,
    session: AdminSession,
) -> Result<Json<Dashboard>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let store = state.store.clone();

    let recipes: Vec<PendingRecipe> = runtime::blocking(move || {
        let pending = lifecycle.list_pending()?;
        Ok(pending.into_iter().map(|r| pending_entry(&store, r)).collect())
    })
    .await?;

    Ok(Json(Dashboard {
        user: session.user.username,
        recipes,
    }))
}

fn pending_entry(store: &crate::store::RecipeStore, recipe: Recipe) -> PendingRecipe {
    let files = match RecipeId::parse(&recipe.recipe_id) {
        Ok(id) if store.exists_private(&id) => archive::list_files(&store.private_path(&id))
            .unwrap_or_else(|e| {
                warn!("Cannot list archive for {}: {}", id, e);
                Vec::new()
            }),
        _ => Vec::new(),
    };
    PendingRecipe {
        data: serde_json::from_str(&recipe.data).unwrap_or(Value::Null),
        id: recipe.recipe_id,
        name: recipe.name,
        files,
    }
}

/// GET /admin/download/:recipe
///
/// Like the public download, but also serves pending archives and never
/// redirects upstream.
pub async fn download(
    State(state): State<Arc<ServerState>>,
    _session: AdminSession,
    Path(recipe): Path<String>,
) -> Result<Response, ApiError> {
    let id = RecipeId::parse(&recipe)?;
    match state.store.open(&id, true).await? {
        Some(archive) => Ok(archive_response(archive)),
        None => Err(Error::NotFound("Recipe".to_string()).into()),
    }
}

/// GET /admin/accept/:recipe
pub async fn accept(
    State(state): State<Arc<ServerState>>,
    _session: AdminSession,
    Path(recipe): Path<String>,
) -> Result<Notice, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let outcome = runtime::blocking(move || lifecycle.accept(&recipe)).await;
    review_notice(outcome.map(|_| "Recipe published successfully"))
}

/// GET /admin/delete/:recipe
pub async fn delete(
    State(state): State<Arc<ServerState>>,
    _session: AdminSession,
    Path(recipe): Path<String>,
) -> Result<Notice, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let outcome = runtime::blocking(move || lifecycle.delete(&recipe)).await;
    review_notice(outcome.map(|_| "Recipe deleted successfully"))
}

fn review_notice(outcome: crate::Result<&'static str>) -> Result<Notice, ApiError> {
    match outcome {
        Ok(message) => Ok(Notice::success(message)),
        Err(Error::NotFound(_)) => Ok(Notice::error(StatusCode::NOT_FOUND, "Recipe not found")),
        Err(e) => Err(e.into()),
    }
}
