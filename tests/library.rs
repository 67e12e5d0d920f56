mod common;

use axum::http::StatusCode;

#[tokio::test]
async fn wishlist_add_and_remove() {
    let app = common::test_app().await;
    let (_, maker) = common::user_with_token(&app, "maker@example.com").await;
    let (_, fan) = common::user_with_token(&app, "fan@example.com").await;
    let id = common::create_game(&app, &maker, "Wanted", 0, 1, &[1]).await;
    let uri = format!("/api/v1/games/{id}/wishlist");

    let (status, _) = common::post_with_auth(&app, &uri, &fan).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::post_with_auth(&app, &uri, &fan).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = common::get(&app, &format!("/api/v1/games/{id}")).await;
    assert_eq!(common::json(&body)["numberOfWishlists"], 1);

    let (status, _) = common::delete_with_auth(&app, &uri, &fan).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::delete_with_auth(&app, &uri, &fan).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn creators_cannot_wishlist_or_own_their_games() {
    let app = common::test_app().await;
    let (_, maker) = common::user_with_token(&app, "self@example.com").await;
    let id = common::create_game(&app, &maker, "Own Work", 0, 1, &[1]).await;

    let (status, _) =
        common::post_with_auth(&app, &format!("/api/v1/games/{id}/wishlist"), &maker).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        common::post_with_auth(&app, &format!("/api/v1/games/{id}/owned"), &maker).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owning_clears_wishlist_and_blocks_rewishlisting() {
    let app = common::test_app().await;
    let (_, maker) = common::user_with_token(&app, "m@example.com").await;
    let (_, fan) = common::user_with_token(&app, "f@example.com").await;
    let id = common::create_game(&app, &maker, "Bought Later", 0, 1, &[1]).await;

    let (status, _) =
        common::post_with_auth(&app, &format!("/api/v1/games/{id}/wishlist"), &fan).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        common::post_with_auth(&app, &format!("/api/v1/games/{id}/owned"), &fan).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = common::get(&app, &format!("/api/v1/games/{id}")).await;
    let game = common::json(&body);
    assert_eq!(game["numberOfWishlists"], 0);
    assert_eq!(game["numberOfOwners"], 1);

    let (status, _) =
        common::post_with_auth(&app, &format!("/api/v1/games/{id}/wishlist"), &fan).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        common::post_with_auth(&app, &format!("/api/v1/games/{id}/owned"), &fan).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        common::delete_with_auth(&app, &format!("/api/v1/games/{id}/owned"), &fan).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        common::delete_with_auth(&app, &format!("/api/v1/games/{id}/owned"), &fan).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn toggles_on_missing_game_are_not_found() {
    let app = common::test_app().await;
    let (_, fan) = common::user_with_token(&app, "lost@example.com").await;

    let (status, _) = common::post_with_auth(&app, "/api/v1/games/77/wishlist", &fan).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = common::post_with_auth(&app, "/api/v1/games/77/owned", &fan).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn toggles_require_auth() {
    let app = common::test_app().await;
    let (_, maker) = common::user_with_token(&app, "auth@example.com").await;
    let id = common::create_game(&app, &maker, "Gated", 0, 1, &[1]).await;

    let (status, _) =
        common::post_with_auth(&app, &format!("/api/v1/games/{id}/wishlist"), "bad-token")
            .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
