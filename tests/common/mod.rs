#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use catalog_api::{
    config::AppConfig,
    db,
    entities::{article, category, product, user},
    services::{DisabledEcoscore, EcoscoreProvider, EnableCascade},
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str =
    "test-secret-key-for-catalog-integration-tests-0123456789abcdefghij";

/// Ecoscore provider answering the same grade for every product.
pub struct FixedGrade(pub Option<&'static str>);

#[async_trait]
impl EcoscoreProvider for FixedGrade {
    async fn fetch_grade(&self, _product: &product::Model) -> Option<String> {
        self.0.map(str::to_string)
    }
}

/// Full router over a migrated SQLite database in a temp dir, with one staff
/// account (`admin`) and one plain account (`shopper`).
pub struct TestApp {
    router: Router,
    pub state: AppState,
    admin_token: String,
    user_token: String,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(EnableCascade::Activate, Arc::new(DisabledEcoscore)).await
    }

    pub async fn with_options(
        enable_cascade: EnableCascade,
        ecoscore: Arc<dyn EcoscoreProvider>,
    ) -> Self {
        let db_dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            db_dir.path().join("catalog_test.db").display()
        );

        let mut cfg = AppConfig::new(
            db_url,
            TEST_JWT_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 4;
        cfg.ecoscore.enabled = false;
        cfg.catalog.enable_cascade = enable_cascade;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::with_ecoscore(pool, cfg, ecoscore);

        let admin = insert_account(&state, "admin", true).await;
        let shopper = insert_account(&state, "shopper", false).await;
        let admin_token = state
            .auth
            .generate_token(&admin)
            .expect("admin token")
            .access;
        let user_token = state
            .auth
            .generate_token(&shopper)
            .expect("user token")
            .access;

        Self {
            router: catalog_api::app(state.clone()),
            state,
            admin_token,
            user_token,
            _db_dir: db_dir,
        }
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    pub fn user_token(&self) -> &str {
        &self.user_token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn as_admin(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(self.admin_token()))
            .await
    }

    pub async fn as_user(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        self.request(method, uri, body, Some(self.user_token()))
            .await
    }

    // ----- seeding (bypasses API validation so any state can be set up) -----

    pub async fn seed_category(&self, name: &str, active: bool) -> category::Model {
        category::ActiveModel {
            name: Set(name.to_string()),
            description: Set(format!("All about {name}")),
            active: Set(active),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed category")
    }

    pub async fn seed_product(&self, category_id: i32, name: &str, active: bool) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            description: Set(String::new()),
            active: Set(active),
            category_id: Set(category_id),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product")
    }

    pub async fn seed_article(
        &self,
        product_id: i32,
        name: &str,
        price: Decimal,
        active: bool,
    ) -> article::Model {
        article::ActiveModel {
            name: Set(name.to_string()),
            description: Set(String::new()),
            active: Set(active),
            price: Set(price),
            product_id: Set(product_id),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed article")
    }

    // ----- reloading -----

    pub async fn category(&self, id: i32) -> Option<category::Model> {
        category::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("load category")
    }

    pub async fn product(&self, id: i32) -> Option<product::Model> {
        product::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("load product")
    }

    pub async fn article(&self, id: i32) -> Option<article::Model> {
        article::Entity::find_by_id(id)
            .one(&*self.state.db)
            .await
            .expect("load article")
    }

    pub async fn category_count(&self) -> u64 {
        category::Entity::find()
            .count(&*self.state.db)
            .await
            .expect("count categories")
    }

    pub async fn article_count(&self) -> u64 {
        article::Entity::find()
            .count(&*self.state.db)
            .await
            .expect("count articles")
    }
}

/// Accounts are inserted with an unusable hash; tokens are minted directly.
async fn insert_account(state: &AppState, username: &str, is_staff: bool) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("!".to_string()),
        is_staff: Set(is_staff),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .expect("seed account")
}

pub async fn response_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body is not JSON")
}

/// Serialized form of a stored timestamp.
pub fn wire_timestamp(value: &chrono::DateTime<chrono::Utc>) -> String {
    value
        .format(catalog_api::handlers::common::timestamp::FORMAT)
        .to_string()
}
