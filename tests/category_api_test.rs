mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use catalog_api::services::{DisabledEcoscore, EnableCascade};
use common::{response_json, wire_timestamp, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

#[tokio::test]
async fn public_listing_shows_only_active_categories_with_stored_timestamps() {
    let app = TestApp::new().await;
    let fruits = app.seed_category("Fruits", true).await;
    app.seed_category("Légumes", false).await;

    let response = app.get("/api/category/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(
        body,
        json!([{
            "id": fruits.id,
            "name": "Fruits",
            "created_at": wire_timestamp(&fruits.created_at),
            "updated_at": wire_timestamp(&fruits.updated_at),
        }])
    );
}

#[tokio::test]
async fn writes_on_public_category_routes_are_not_allowed() {
    let app = TestApp::new().await;
    let fruits = app.seed_category("Fruits", true).await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/category/",
            Some(json!({ "name": "Pasta", "description": "Pasta and rice" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Method \"POST\" not allowed.");
    assert_eq!(app.category_count().await, 1);

    let uri = format!("/api/category/{}/", fruits.id);
    for method in [Method::PUT, Method::PATCH, Method::DELETE] {
        let response = app
            .request(method, &uri, Some(json!({ "name": "Fruit" })), None)
            .await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
    assert_eq!(app.category(fruits.id).await.unwrap().name, "Fruits");
}

#[tokio::test]
async fn detail_nests_active_products_and_their_active_articles() {
    let app = TestApp::new().await;
    // Retrieval is not restricted to active categories.
    let category = app.seed_category("Épicerie", false).await;
    let pasta = app.seed_product(category.id, "Pasta", true).await;
    app.seed_product(category.id, "Old rice", false).await;
    let penne = app.seed_article(pasta.id, "Penne 500g", dec!(1.20), true).await;
    app.seed_article(pasta.id, "Penne 5kg", dec!(9.90), false).await;

    let response = app.get(&format!("/api/category/{}/", category.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["name"], "Épicerie");
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], pasta.id);
    assert_eq!(products[0]["category"], category.id);
    assert!(products[0].get("ecoscore").is_none());

    let articles = products[0]["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["id"], penne.id);
    assert_eq!(articles[0]["price"], "1.20");
}

#[tokio::test]
async fn unknown_category_is_not_found() {
    let app = TestApp::new().await;
    let response = app.get("/api/category/999/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn state_changes_require_an_admin_token() {
    let app = TestApp::new().await;
    let fruits = app.seed_category("Fruits", true).await;
    let uri = format!("/api/category/{}/disable/", fruits.id);

    let anonymous = app.request(Method::POST, &uri, None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let shopper = app.as_user(Method::POST, &uri, None).await;
    assert_eq!(shopper.status(), StatusCode::FORBIDDEN);

    assert!(app.category(fruits.id).await.unwrap().active);

    // Wrong verb beats missing credentials.
    let get = app.get(&uri).await;
    assert_eq!(get.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn disabling_a_category_cascades_to_products_but_not_articles() {
    let app = TestApp::new().await;
    let fruits = app.seed_category("Fruits", true).await;
    let apple = app.seed_product(fruits.id, "Apple", true).await;
    let pear = app.seed_product(fruits.id, "Pear", true).await;
    let golden = app.seed_article(apple.id, "Golden 1kg", dec!(2.50), true).await;

    let response = app
        .as_admin(Method::POST, &format!("/api/category/{}/disable/", fruits.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await,
        json!({ "id": fruits.id, "active": false, "changed": true, "cascaded": 2 })
    );

    assert!(!app.category(fruits.id).await.unwrap().active);
    assert!(!app.product(apple.id).await.unwrap().active);
    assert!(!app.product(pear.id).await.unwrap().active);
    assert!(app.article(golden.id).await.unwrap().active);

    let listing = response_json(app.get("/api/category/").await).await;
    assert_eq!(listing, json!([]));
}

#[tokio::test]
async fn disabling_twice_is_a_no_op() {
    let app = TestApp::new().await;
    let fruits = app.seed_category("Fruits", true).await;
    let uri = format!("/api/category/{}/disable/", fruits.id);

    app.as_admin(Method::POST, &uri, None).await;
    let after_first = app.category(fruits.id).await.unwrap();

    let response = app.as_admin(Method::POST, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["changed"], false);
    assert_eq!(body["cascaded"], 0);
    assert_eq!(app.category(fruits.id).await.unwrap(), after_first);
}

#[tokio::test]
async fn enabling_a_category_activates_its_products_by_default() {
    let app = TestApp::new().await;
    let fruits = app.seed_category("Fruits", false).await;
    let apple = app.seed_product(fruits.id, "Apple", false).await;

    let response = app
        .as_admin(Method::POST, &format!("/api/category/{}/able/", fruits.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(app.category(fruits.id).await.unwrap().active);
    assert!(app.product(apple.id).await.unwrap().active);
}

#[tokio::test]
async fn deactivate_policy_keeps_products_inactive_on_enable() {
    let app = TestApp::with_options(EnableCascade::Deactivate, Arc::new(DisabledEcoscore)).await;
    let fruits = app.seed_category("Fruits", false).await;
    let apple = app.seed_product(fruits.id, "Apple", true).await;

    let response = app
        .as_admin(Method::POST, &format!("/api/category/{}/able/", fruits.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert!(app.category(fruits.id).await.unwrap().active);
    assert!(!app.product(apple.id).await.unwrap().active);
}

#[tokio::test]
async fn state_change_on_unknown_category_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .as_admin(Method::POST, "/api/category/404/able/", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ----- admin -----

#[tokio::test]
async fn admin_routes_reject_plain_users() {
    let app = TestApp::new().await;
    let response = app.as_user(Method::GET, "/api/admin/category/", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/api/admin/category/").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_listing_includes_inactive_categories_and_descriptions() {
    let app = TestApp::new().await;
    app.seed_category("Fruits", true).await;
    app.seed_category("Légumes", false).await;

    let response = app.as_admin(Method::GET, "/api/admin/category/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Fruits", "Légumes"]);
    assert_eq!(body[1]["description"], "All about Légumes");
}

#[tokio::test]
async fn admin_create_validates_name_and_description() {
    let app = TestApp::new().await;
    app.seed_category("Fruits", true).await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/admin/category/",
            Some(json!({ "name": "Fruits", "description": "Fresh fruits" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["fields"]["name"], json!(["Category already exists"]));

    let response = app
        .as_admin(
            Method::POST,
            "/api/admin/category/",
            Some(json!({ "name": "Dairy", "description": "Milk and cheese" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(
        body["fields"]["description"],
        json!(["Name must be in description"])
    );

    assert_eq!(app.category_count().await, 1);
}

#[tokio::test]
async fn malformed_admin_payloads_get_the_json_error_body() {
    let app = TestApp::new().await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/admin/category/",
            Some(json!({ "description": "Pasta" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
    let body = response_json(response).await;
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().unwrap().contains("missing field `name`"));
    assert!(body["request_id"].is_string());
    assert_eq!(app.category_count().await, 0);

    let response = app.get("/api/category/pasta/").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["error"], "Bad Request");
}

#[tokio::test]
async fn admin_crud_round() {
    let app = TestApp::new().await;

    let response = app
        .as_admin(
            Method::POST,
            "/api/admin/category/",
            Some(json!({ "name": "Dairy", "description": "Dairy products" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    let id = created["id"].as_i64().unwrap() as i32;
    assert!(!app.category(id).await.unwrap().active);

    let uri = format!("/api/admin/category/{id}/");

    // Partial update: the stored name must still appear in the new description.
    let response = app
        .as_admin(
            Method::PATCH,
            &uri,
            Some(json!({ "description": "Cheese only" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .as_admin(
            Method::PATCH,
            &uri,
            Some(json!({ "description": "Dairy: cheese only" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["description"], "Dairy: cheese only");

    let response = app
        .as_admin(
            Method::PUT,
            &uri,
            Some(json!({ "name": "Cheese", "description": "Cheese counter" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.category(id).await.unwrap().name, "Cheese");

    let response = app.as_admin(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["products"], json!([]));

    let response = app.as_admin(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.category(id).await.is_none());

    let response = app.as_admin(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_category_removes_its_products_and_articles() {
    let app = TestApp::new().await;
    let fruits = app.seed_category("Fruits", true).await;
    let apple = app.seed_product(fruits.id, "Apple", true).await;
    app.seed_article(apple.id, "Golden 1kg", dec!(2.50), true).await;

    let response = app
        .as_admin(
            Method::DELETE,
            &format!("/api/admin/category/{}/", fruits.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(app.product(apple.id).await.is_none());
    assert_eq!(app.article_count().await, 0);
}
