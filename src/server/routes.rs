// src/server/routes.rs
//! Axum router configuration for the Larder server
//!
//! Archive downloads skip the compression layer; they are gzip already.

use crate::server::ServerState;
use crate::server::handlers::{admin, creation, recipes, site};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{any, get, post},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router
pub fn create_router(state: Arc<ServerState>) -> Router {
    // The recipe API is called from the desktop client, not a browser origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let archive_routes = Router::new()
        .route("/v1/recipes/download/:recipe", get(recipes::download))
        .route("/admin/download/:recipe", get(admin::download))
        .with_state(state.clone());

    let upload_routes = Router::new()
        .route("/new", post(creation::create))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state.clone());

    let compressed_routes = Router::new()
        .route("/health", get(site::health))
        // Public recipe API
        .route("/v1/recipes/search", get(recipes::search))
        .route("/v1/*rest", any(recipes::passthrough))
        // Submissions
        .route("/github", post(creation::github))
        // Admin
        .route("/admin/register", post(admin::register))
        .route("/admin/login", post(admin::login))
        .route("/admin/logout", get(admin::logout))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/accept/:recipe", get(admin::accept))
        .route("/admin/delete/:recipe", get(admin::delete))
        // Site
        .route("/", get(site::index))
        .route("/terms", get(site::terms))
        .route("/privacy", get(site::privacy))
        .layer(CompressionLayer::new())
        .with_state(state);

    Router::new()
        .merge(archive_routes)
        .merge(upload_routes)
        .merge(compressed_routes)
        .fallback(site::fallback)
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{ServerConfig, prepare_storage};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn app() -> (tempfile::TempDir, Router) {
        let temp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            db_path: temp.path().join("larder.db"),
            recipe_dir: temp.path().join("recipes"),
            upstream_url: "https://upstream.example.com".to_string(),
            ..ServerConfig::default()
        };
        prepare_storage(&config).unwrap();
        let state = Arc::new(ServerState::new(config).unwrap());
        (temp, create_router(state))
    }

    async fn get(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (_temp, app) = app();
        let response = get(app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_passthrough_keeps_path_and_query() {
        let (_temp, app) = app();
        let response = get(app, "/v1/features/default?os=linux").await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            location(&response),
            "https://upstream.example.com/v1/features/default?os=linux"
        );
    }

    #[tokio::test]
    async fn test_unknown_download_redirects_upstream() {
        let (_temp, app) = app();
        let response = get(app, "/v1/recipes/download/slack").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            "https://upstream.example.com/v1/recipes/download/slack"
        );
    }

    #[tokio::test]
    async fn test_static_redirects() {
        let (_temp, app) = app();
        let response = get(app.clone(), "/terms").await;
        assert_eq!(location(&response), "/terms.html");

        let response = get(app.clone(), "/privacy").await;
        assert_eq!(location(&response), "/privacy.html");

        let response = get(app, "/no/such/page").await;
        assert!(response.status().is_redirection());
        assert_eq!(location(&response), "/");
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let (_temp, app) = app();
        for uri in [
            "/admin/dashboard",
            "/admin/accept/foo",
            "/admin/delete/foo",
            "/admin/download/foo",
            "/admin/logout",
        ] {
            let response = get(app.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_search_requires_needle() {
        let (_temp, app) = app();
        let response = get(app, "/v1/recipes/search").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
