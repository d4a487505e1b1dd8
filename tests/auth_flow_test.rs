mod common;

use axum::http::{Method, StatusCode};
use catalog_api::entities::user;
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::json;

async fn obtain(app: &TestApp, username: &str, password: &str) -> axum::response::Response {
    app.request(
        Method::POST,
        "/api/token/",
        Some(json!({ "username": username, "password": password })),
        None,
    )
    .await
}

#[tokio::test]
async fn staff_login_yields_tokens_that_unlock_admin_routes() {
    let app = TestApp::new().await;
    app.state
        .auth
        .create_user("marie", "correct horse battery staple", true)
        .await
        .expect("create staff user");
    let fruits = app.seed_category("Fruits", false).await;

    let response = obtain(&app, "marie", "correct horse battery staple").await;
    assert_eq!(response.status(), StatusCode::OK);
    let pair = response_json(response).await;
    let access = pair["access"].as_str().unwrap().to_string();
    let refresh = pair["refresh"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/category/{}/able/", fruits.id),
            None,
            Some(&access),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.category(fruits.id).await.unwrap().active);

    // A refresh token is not an access token.
    let response = app
        .request(Method::GET, "/api/admin/category/", None, Some(&refresh))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/token/refresh/",
            Some(json!({ "refresh": refresh })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let renewed = response_json(response).await;
    let new_access = renewed["access"].as_str().unwrap();

    let response = app
        .request(Method::GET, "/api/admin/category/", None, Some(new_access))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn plain_users_can_write_articles_but_not_change_state() {
    let app = TestApp::new().await;
    app.state
        .auth
        .create_user("paul", "s3cret-pass", false)
        .await
        .expect("create user");
    let fruits = app.seed_category("Fruits", true).await;
    let apple = app.seed_product(fruits.id, "Apple", true).await;

    let pair = response_json(obtain(&app, "paul", "s3cret-pass").await).await;
    let access = pair["access"].as_str().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/article/",
            Some(json!({ "name": "Gala 1kg", "price": "2.80", "product": apple.id })),
            Some(access),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::POST,
            &format!("/api/product/{}/disable/", apple.id),
            None,
            Some(access),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_INSUFFICIENT_PERMISSIONS");
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_rejected_alike() {
    let app = TestApp::new().await;
    app.state
        .auth
        .create_user("marie", "right-password", true)
        .await
        .expect("create user");

    let wrong = obtain(&app, "marie", "wrong-password").await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let wrong_body = response_json(wrong).await;

    let unknown = obtain(&app, "nobody", "right-password").await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_json(unknown).await["error"], wrong_body["error"]);
}

#[tokio::test]
async fn inactive_accounts_cannot_log_in() {
    let app = TestApp::new().await;
    let account = app
        .state
        .auth
        .create_user("gone", "old-password", true)
        .await
        .expect("create user");

    let mut model: user::ActiveModel = account.into();
    model.is_active = Set(false);
    model.update(&*app.state.db).await.expect("deactivate");

    let response = obtain(&app, "gone", "old-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn access_token_cannot_be_used_to_refresh() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/token/refresh/",
            Some(json!({ "refresh": app.admin_token() })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_and_non_bearer_credentials_are_unauthorized() {
    let app = TestApp::new().await;
    let fruits = app.seed_category("Fruits", true).await;
    let apple = app.seed_product(fruits.id, "Apple", true).await;
    app.seed_article(apple.id, "Golden 1kg", dec!(2.50), true).await;

    let response = app
        .request(Method::DELETE, "/api/article/1/", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.article_count().await, 1);
}

#[tokio::test]
async fn token_endpoint_only_accepts_post() {
    let app = TestApp::new().await;
    let response = app.get("/api/token/").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
