use axum::Json;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "1.0.0",
        description = r#"
# Catalog API

Categories, products and articles for an online grocery catalog.

## Visibility

Public listings only show active entities. Products show their active
articles and, on listings and detail, the Open Food Facts ecoscore grade.

## Authentication

Writes require a JWT obtained from `POST /api/token/`:

```
Authorization: Bearer <access-token>
```

State changes (`disable` / `able`) and everything under `/api/admin/`
require a staff account.

## Errors

```json
{
  "error": "Bad Request",
  "message": "Validation failed",
  "fields": { "price": ["Price must be greater than 1€"] },
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
    ),
    tags(
        (name = "categories", description = "Category browsing and state changes"),
        (name = "products", description = "Product browsing and state changes"),
        (name = "articles", description = "Article browsing and writes"),
        (name = "admin", description = "Staff-only catalog management"),
        (name = "auth", description = "Token endpoints"),
        (name = "health", description = "Health check")
    ),
    paths(
        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::disable_category,
        crate::handlers::categories::enable_category,
        crate::handlers::categories::admin_list_categories,
        crate::handlers::categories::admin_get_category,
        crate::handlers::categories::admin_create_category,
        crate::handlers::categories::admin_replace_category,
        crate::handlers::categories::admin_update_category,
        crate::handlers::categories::admin_delete_category,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::disable_product,
        crate::handlers::products::enable_product,
        crate::handlers::products::admin_list_products,
        crate::handlers::products::admin_get_product,
        crate::handlers::products::admin_create_product,
        crate::handlers::products::admin_replace_product,
        crate::handlers::products::admin_update_product,
        crate::handlers::products::admin_delete_product,

        // Articles (also served under /api/admin/article/)
        crate::handlers::articles::list_articles,
        crate::handlers::articles::get_article,
        crate::handlers::articles::create_article,
        crate::handlers::articles::replace_article,
        crate::handlers::articles::update_article,
        crate::handlers::articles::delete_article,

        // Auth
        crate::auth::obtain_token,
        crate::auth::refresh_access_token,

        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::handlers::categories::CategorySummary,
            crate::handlers::categories::AdminCategory,
            crate::handlers::categories::CategoryDetail,
            crate::handlers::products::ProductResponse,
            crate::handlers::products::AdminProduct,
            crate::handlers::articles::ArticleResponse,
            crate::handlers::common::StateChangeResponse,
            crate::handlers::health::HealthResponse,
            crate::handlers::health::ComponentHealth,
            crate::handlers::health::ComponentStatus,

            crate::services::catalog::NewCategory,
            crate::services::catalog::CategoryChanges,
            crate::services::catalog::NewProduct,
            crate::services::catalog::ProductChanges,
            crate::services::catalog::NewArticle,
            crate::services::catalog::ArticleChanges,

            crate::auth::TokenRequest,
            crate::auth::TokenPair,
            crate::auth::RefreshRequest,
            crate::auth::AccessToken,

            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

/// Registers the `bearer_auth` scheme referenced by the guarded paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// `GET /api-docs/openapi.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDocV1::openapi())
}
