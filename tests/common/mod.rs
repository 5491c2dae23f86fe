// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use larder::db::{self, models::Recipe};
use larder::recipe::ImportConfig;
use larder::server::{ServerConfig, ServerState, create_router, prepare_storage};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

pub const REGISTRATION_KEY: &str = "sesame";
const BOUNDARY: &str = "larder-test-boundary";

/// A router over fresh storage, with upstream and GitHub pointed at a mock server
pub struct TestServer {
    pub temp: TempDir,
    pub state: Arc<ServerState>,
    pub app: Router,
    /// Stands in for both the upstream service and GitHub
    pub remote: MockServer,
}

pub async fn setup_server() -> TestServer {
    let temp = tempfile::tempdir().unwrap();
    let remote = MockServer::start().await;
    let config = ServerConfig {
        db_path: temp.path().join("larder.db"),
        recipe_dir: temp.path().join("recipes"),
        upstream_url: remote.uri(),
        import: ImportConfig {
            raw_base: remote.uri(),
            archive_base: remote.uri(),
            ..ImportConfig::default()
        },
        registration_key: Some(REGISTRATION_KEY.to_string()),
        login_failure_threshold: 3,
        ..ServerConfig::default()
    };
    prepare_storage(&config).unwrap();

    let state = Arc::new(ServerState::new(config).unwrap());
    let app = create_router(state.clone());
    TestServer {
        temp,
        state,
        app,
        remote,
    }
}

/// Seed published and pending records directly, in one transaction
pub fn seed_records(server: &TestServer, records: &[(&str, &str, bool)]) {
    let mut conn = db::open(server.state.registry.path()).unwrap();
    db::transaction(&mut conn, |tx| {
        for (id, name, public) in records {
            Recipe::new(
                *id,
                *name,
                r#"{"author":"bar","featured":false,"version":"1.0.0"}"#.to_string(),
            )
            .insert(tx)?;
            if *public {
                Recipe::set_public(tx, id, true)?;
            }
        }
        Ok(())
    })
    .unwrap();
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn location(&self) -> &str {
        self.headers[header::LOCATION].to_str().unwrap()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    TestResponse {
        status,
        headers,
        body: body.to_vec(),
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// `application/x-www-form-urlencoded` POST
pub fn post_form(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// `multipart/form-data` POST with text fields and `files` parts
pub fn post_multipart(uri: &str, fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (file_name, contents) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Upload form for recipe `id` with two small files
pub fn upload_request(id: &str) -> Request<Body> {
    post_multipart(
        "/new",
        &[
            ("id", id),
            ("name", "Foo"),
            ("author", "bar"),
            ("png", "https://example.com/foo.png"),
            ("svg", "https://example.com/foo.svg"),
        ],
        &[
            ("package.json", br#"{"id":"foo","name":"Foo"}"#),
            ("index.js", b"module.exports = () => {};"),
        ],
    )
}

/// Register the admin account and return its bearer token
pub async fn admin_token(server: &TestServer) -> String {
    let response = send(
        &server.app,
        post_form(
            "/admin/register",
            &[
                ("username", "admin"),
                ("email", "admin@example.com"),
                ("password", "hunter22"),
                ("key", REGISTRATION_KEY),
                ("terms", "on"),
            ],
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json()["token"].as_str().unwrap().to_string()
}
