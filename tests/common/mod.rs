#![allow(dead_code)]
#![allow(clippy::expect_used)]

use std::ops::Deref;
use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, DatabaseConnection};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use game_market_api::config::{Config, DEFAULT_MAX_IMAGE_BYTES, Environment};
use game_market_api::state::AppState;
use game_market_api::storage::ImageStore;

pub const AUTH_HEADER: &str = "X-Authorization";
pub const PASSWORD: &str = "correct-horse";

/// Router backed by an in-memory `SQLite` database and a scratch image directory.
///
/// Derefs to the router; the image directory lives as long as this value.
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub images: TempDir,
}

impl Deref for TestApp {
    type Target = Router;

    fn deref(&self) -> &Router {
        &self.router
    }
}

impl TestApp {
    pub fn image_dir(&self) -> PathBuf {
        self.images.path().to_path_buf()
    }
}

/// Build the app with migrations applied and genres/platforms seeded.
pub async fn test_app() -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // One connection so every query sees the same in-memory database.
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = sea_orm::Database::connect(options)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");

    let images = tempfile::tempdir().expect("create image dir");

    let config = Config {
        database_url: String::new(),
        server_host: std::net::IpAddr::from([127, 0, 0, 1]),
        server_port: 0,
        environment: Environment::Development,
        log_level: "warn".to_string(),
        image_dir: images.path().to_path_buf(),
        max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        frontend_url: "http://localhost:8080".to_string(),
    };

    let state = AppState {
        db: db.clone(),
        images: ImageStore::new(images.path()),
        config: config.clone(),
    };

    TestApp {
        router: game_market_api::routes::router(&config).with_state(state),
        db,
        images,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(body.to_vec()).unwrap_or_default();

    (status, body_str)
}

fn build(method: Method, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTH_HEADER, token);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap_or_default(),
        None => builder.body(Body::empty()).unwrap_or_default(),
    }
}

/// Test helper: send a GET request to the app and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    send(app, build(Method::GET, uri, None, None)).await
}

pub async fn get_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    send(app, build(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> (StatusCode, String) {
    send(app, build(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_with_auth(
    app: &Router,
    uri: &str,
    body: &Value,
    token: &str,
) -> (StatusCode, String) {
    send(app, build(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn post_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    send(app, build(Method::POST, uri, Some(token), None)).await
}

pub async fn patch_json_with_auth(
    app: &Router,
    uri: &str,
    body: &Value,
    token: &str,
) -> (StatusCode, String) {
    send(app, build(Method::PATCH, uri, Some(token), Some(body))).await
}

pub async fn delete_with_auth(app: &Router, uri: &str, token: &str) -> (StatusCode, String) {
    send(app, build(Method::DELETE, uri, Some(token), None)).await
}

/// PUT raw bytes with the given content type.
pub async fn put_bytes_with_auth(
    app: &Router,
    uri: &str,
    content_type: &str,
    bytes: Vec<u8>,
    token: &str,
) -> (StatusCode, String) {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(AUTH_HEADER, token)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap_or_default();
    send(app, request).await
}

/// GET returning (status, content type, raw bytes).
pub async fn get_bytes(app: &Router, uri: &str) -> (StatusCode, String, Vec<u8>) {
    let request = build(Method::GET, uri, None, None);
    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();

    (status, content_type, body.to_vec())
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or(Value::Null)
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Register a user and return its id.
pub async fn register(app: &Router, email: &str) -> i32 {
    let (status, body) = post_json(
        app,
        "/api/v1/users/register",
        &json!({
            "email": email,
            "firstName": "Test",
            "lastName": "User",
            "password": PASSWORD,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    let id = json(&body)["userId"].as_i64().expect("userId in body");
    i32::try_from(id).expect("userId fits i32")
}

/// Log in and return the session token.
pub async fn login(app: &Router, email: &str) -> String {
    let (status, body) = post_json(
        app,
        "/api/v1/users/login",
        &json!({ "email": email, "password": PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    json(&body)["token"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

/// Register and log in; returns (user id, token).
pub async fn user_with_token(app: &Router, email: &str) -> (i32, String) {
    let id = register(app, email).await;
    let token = login(app, email).await;
    (id, token)
}

/// Create a game and return its id.
pub async fn create_game(
    app: &Router,
    token: &str,
    title: &str,
    price: i32,
    genre_id: i32,
    platform_ids: &[i32],
) -> i32 {
    let (status, body) = post_json_with_auth(
        app,
        "/api/v1/games",
        &json!({
            "title": title,
            "description": format!("{title} is a game."),
            "genreId": genre_id,
            "price": price,
            "platformIds": platform_ids,
        }),
        token,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create game failed: {body}");
    let id = json(&body)["gameId"].as_i64().expect("gameId in body");
    i32::try_from(id).expect("gameId fits i32")
}
