//! Catalog API Library
//!
//! Categories, products and articles with cascading active/inactive state,
//! role-dependent visibility and an external ecoscore lookup.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::FromRef,
    routing::{get, post, put},
    Extension, Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::{AuthConfig, AuthRouteExt, AuthService, ADMIN_ROLE};
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::handlers::common::method_not_allowed;
use crate::services::{
    ecoscore::provider_from_config, CatalogService, ConsistencyService, EcoscoreProvider,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub catalog: Arc<CatalogService>,
    pub consistency: Arc<ConsistencyService>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wires every service from configuration, including the ecoscore provider.
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Result<Self, ServiceError> {
        let ecoscore = provider_from_config(&config.ecoscore)?;
        Ok(Self::with_ecoscore(db, config, ecoscore))
    }

    /// Same as [`AppState::new`] with an explicit ecoscore provider.
    pub fn with_ecoscore(
        db: DatabaseConnection,
        config: AppConfig,
        ecoscore: Arc<dyn EcoscoreProvider>,
    ) -> Self {
        let db = Arc::new(db);
        let catalog = Arc::new(CatalogService::new(db.clone(), ecoscore));
        let consistency = Arc::new(ConsistencyService::new(
            db.clone(),
            config.catalog.enable_cascade,
        ));
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config), db.clone()));

        Self {
            db,
            config: Arc::new(config),
            catalog,
            consistency,
            auth,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Catalog routes, mounted under `/api`.
///
/// Every path gets the 405 fallback; guards are per method so reads on a
/// path stay public while writes on the same path require a token.
pub fn api_routes() -> Router<AppState> {
    use handlers::{articles, categories, products};

    let categories_routes = Router::new()
        .route(
            "/category/",
            get(categories::list_categories).fallback(method_not_allowed),
        )
        .route(
            "/category/:id/",
            get(categories::get_category).fallback(method_not_allowed),
        )
        .route(
            "/category/:id/disable/",
            post(categories::disable_category)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        )
        .route(
            "/category/:id/able/",
            post(categories::enable_category)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        );

    let products_routes = Router::new()
        .route(
            "/product/",
            get(products::list_products).fallback(method_not_allowed),
        )
        .route(
            "/product/:id/",
            get(products::get_product).fallback(method_not_allowed),
        )
        .route(
            "/product/:id/disable/",
            post(products::disable_product)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        )
        .route(
            "/product/:id/able/",
            post(products::enable_product)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        );

    let articles_routes = Router::new()
        .route(
            "/article/",
            get(articles::list_articles)
                .merge(post(articles::create_article).with_auth())
                .fallback(method_not_allowed),
        )
        .route(
            "/article/:id/",
            get(articles::get_article)
                .merge(
                    put(articles::replace_article)
                        .patch(articles::update_article)
                        .delete(articles::delete_article)
                        .with_auth(),
                )
                .fallback(method_not_allowed),
        );

    let admin_routes = Router::new()
        .route(
            "/admin/category/",
            get(categories::admin_list_categories)
                .post(categories::admin_create_category)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        )
        .route(
            "/admin/category/:id/",
            get(categories::admin_get_category)
                .put(categories::admin_replace_category)
                .patch(categories::admin_update_category)
                .delete(categories::admin_delete_category)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        )
        .route(
            "/admin/product/",
            get(products::admin_list_products)
                .post(products::admin_create_product)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        )
        .route(
            "/admin/product/:id/",
            get(products::admin_get_product)
                .put(products::admin_replace_product)
                .patch(products::admin_update_product)
                .delete(products::admin_delete_product)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        )
        .route(
            "/admin/article/",
            get(articles::list_articles)
                .post(articles::create_article)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        )
        .route(
            "/admin/article/:id/",
            get(articles::get_article)
                .put(articles::replace_article)
                .patch(articles::update_article)
                .delete(articles::delete_article)
                .with_role(ADMIN_ROLE)
                .fallback(method_not_allowed),
        );

    let token_routes = Router::new()
        .route(
            "/token/",
            post(auth::obtain_token).fallback(method_not_allowed),
        )
        .route(
            "/token/refresh/",
            post(auth::refresh_access_token).fallback(method_not_allowed),
        );

    Router::new()
        .merge(categories_routes)
        .merge(products_routes)
        .merge(articles_routes)
        .merge(admin_routes)
        .merge(token_routes)
}

/// Full application router without the transport layers added in `main`
/// (CORS, compression, timeout), so tests can drive it directly.
pub fn app(state: AppState) -> Router {
    let auth_service = state.auth.clone();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/api", api_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(Extension(auth_service))
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
