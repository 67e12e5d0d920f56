mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn health_root_returns_200() {
    let app = common::test_app().await;
    let (status, body) = common::get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);

    let json = common::json(&body);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn health_api_reports_database() {
    let app = common::test_app().await;
    let (status, body) = common::get(&app, "/api/v1/health").await;

    assert_eq!(status, StatusCode::OK);

    let json = common::json(&body);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::test_app().await;
    let (status, _body) = common::get(&app, "/api/v1/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
