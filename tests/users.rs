mod common;

use axum::http::StatusCode;
use serde_json::json;

// ──────────────────────────────────────────────────────────────────────────────
// POST /api/v1/users/register
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_returns_user_id() {
    let app = common::test_app().await;
    let id = common::register(&app, "ada@example.com").await;
    assert!(id > 0);
}

#[tokio::test]
async fn register_same_email_twice_is_forbidden() {
    let app = common::test_app().await;
    common::register(&app, "dup@example.com").await;

    let (status, body) = common::post_json(
        &app,
        "/api/v1/users/register",
        &json!({
            "email": "dup@example.com",
            "firstName": "Other",
            "lastName": "Person",
            "password": "another-pass",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(common::json(&body)["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn register_rejects_invalid_fields() {
    let app = common::test_app().await;
    let cases = [
        json!({ "email": "not-an-email", "firstName": "A", "lastName": "B", "password": "secret1" }),
        json!({ "email": "a@b.com", "firstName": "", "lastName": "B", "password": "secret1" }),
        json!({ "email": "a@b.com", "firstName": "A", "lastName": "B", "password": "short" }),
        json!({ "email": "a@b.com", "firstName": "A", "password": "secret1" }),
    ];
    for body in cases {
        let (status, _) = common::post_json(&app, "/api/v1/users/register", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {body}");
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Login / logout
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_wrong_password_is_unauthorized() {
    let app = common::test_app().await;
    common::register(&app, "login@example.com").await;

    let (status, _) = common::post_json(
        &app,
        "/api/v1/users/login",
        &json!({ "email": "login@example.com", "password": "wrong-password" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::post_json(
        &app,
        "/api/v1/users/login",
        &json!({ "email": "nobody@example.com", "password": common::PASSWORD }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_token_and_logout_revokes_it() {
    let app = common::test_app().await;
    let (id, token) = common::user_with_token(&app, "session@example.com").await;
    assert_eq!(token.len(), 32);

    let (status, body) =
        common::get_with_auth(&app, &format!("/api/v1/users/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = common::post_with_auth(&app, "/api/v1/users/logout", &token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::post_with_auth(&app, "/api/v1/users/logout", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_token_is_unauthorized() {
    let app = common::test_app().await;
    let (status, body) = common::post_json(&app, "/api/v1/users/logout", &json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(common::json(&body)["error"]["code"], "UNAUTHORIZED");
}

// ──────────────────────────────────────────────────────────────────────────────
// GET /api/v1/users/{id}
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn view_user_shows_email_only_to_self() {
    let app = common::test_app().await;
    let (id, token) = common::user_with_token(&app, "self@example.com").await;
    let (_, other_token) = common::user_with_token(&app, "other@example.com").await;

    let (_, body) = common::get_with_auth(&app, &format!("/api/v1/users/{id}"), &token).await;
    let own = common::json(&body);
    assert_eq!(own["email"], "self@example.com");
    assert_eq!(own["firstName"], "Test");

    let (_, body) =
        common::get_with_auth(&app, &format!("/api/v1/users/{id}"), &other_token).await;
    assert!(common::json(&body).get("email").is_none());

    let (status, body) = common::get(&app, &format!("/api/v1/users/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(common::json(&body).get("email").is_none());
}

#[tokio::test]
async fn view_missing_user_is_not_found() {
    let app = common::test_app().await;
    let (status, _) = common::get(&app, "/api/v1/users/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_user_id_is_a_json_bad_request() {
    let app = common::test_app().await;
    for uri in ["/api/v1/users/abc", "/api/v1/users/99999999999", "/api/v1/users/abc/image"] {
        let (status, body) = common::get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(common::json(&body)["error"]["code"], "BAD_REQUEST", "{uri}: {body}");
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// PATCH /api/v1/users/{id}
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_names_and_email() {
    let app = common::test_app().await;
    let (id, token) = common::user_with_token(&app, "edit@example.com").await;

    let (status, body) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/users/{id}"),
        &json!({ "firstName": "Grace", "lastName": "Hopper", "email": "grace@example.com" }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let json = common::json(&body);
    assert_eq!(json["firstName"], "Grace");
    assert_eq!(json["lastName"], "Hopper");
    assert_eq!(json["email"], "grace@example.com");
}

#[tokio::test]
async fn update_other_user_is_forbidden() {
    let app = common::test_app().await;
    let victim = common::register(&app, "victim@example.com").await;
    let (_, token) = common::user_with_token(&app, "attacker@example.com").await;

    let (status, _) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/users/{victim}"),
        &json!({ "firstName": "Pwned" }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_to_taken_email_is_forbidden() {
    let app = common::test_app().await;
    common::register(&app, "taken@example.com").await;
    let (id, token) = common::user_with_token(&app, "mine@example.com").await;

    let (status, _) = common::patch_json_with_auth(
        &app,
        &format!("/api/v1/users/{id}"),
        &json!({ "email": "taken@example.com" }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn password_change_rules() {
    let app = common::test_app().await;
    let (id, token) = common::user_with_token(&app, "pw@example.com").await;
    let uri = format!("/api/v1/users/{id}");

    // Missing current password
    let (status, _) =
        common::patch_json_with_auth(&app, &uri, &json!({ "password": "brand-new" }), &token)
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Wrong current password
    let (status, _) = common::patch_json_with_auth(
        &app,
        &uri,
        &json!({ "password": "brand-new", "currentPassword": "not-it" }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Same as current
    let (status, _) = common::patch_json_with_auth(
        &app,
        &uri,
        &json!({ "password": common::PASSWORD, "currentPassword": common::PASSWORD }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::patch_json_with_auth(
        &app,
        &uri,
        &json!({ "password": "brand-new", "currentPassword": common::PASSWORD }),
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = common::post_json(
        &app,
        "/api/v1/users/login",
        &json!({ "email": "pw@example.com", "password": "brand-new" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_with_no_fields_is_bad_request() {
    let app = common::test_app().await;
    let (id, token) = common::user_with_token(&app, "empty@example.com").await;

    let (status, _) =
        common::patch_json_with_auth(&app, &format!("/api/v1/users/{id}"), &json!({}), &token)
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
