use crate::{
    entities::article,
    errors::ApiError,
    handlers::common::{
        created_response, no_content_response, price, success_response, timestamp, ApiJson,
        ApiPath,
    },
    services::{
        catalog::{ArticleChanges, NewArticle},
        visibility::{parse_active_flag, ArticleFilters},
        Role,
    },
    AppState,
};
use axum::{
    extract::{Query, State},
    response::{Json, Response},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// The article routes are mounted twice (`/api/article/` and
// `/api/admin/article/`); the handlers below serve both.

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArticleListQuery {
    /// `true` or `false` (any case); other values are ignored
    pub active: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "created_at": "2024-01-31T09:15:00.123456Z",
    "updated_at": "2024-01-31T09:15:00.123456Z",
    "name": "Apple 1kg",
    "description": "",
    "active": true,
    "price": "2.50",
    "product": 4
}))]
pub struct ArticleResponse {
    pub id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::serialize")]
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub description: String,
    pub active: bool,
    #[serde(serialize_with = "price::serialize")]
    #[schema(value_type = String)]
    pub price: Decimal,
    /// Owning product id
    pub product: i32,
}

impl From<article::Model> for ArticleResponse {
    fn from(model: article::Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            name: model.name,
            description: model.description,
            active: model.active,
            price: model.price,
            product: model.product_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/article/",
    params(ArticleListQuery),
    responses(
        (status = 200, description = "Articles, optionally filtered on state", body = [ArticleResponse])
    ),
    tag = "articles"
)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleListQuery>,
) -> Result<Json<Vec<ArticleResponse>>, ApiError> {
    let filters = ArticleFilters {
        active: parse_active_flag(query.active.as_deref()),
    };
    let articles = state.catalog.list_articles(Role::Public, filters).await?;
    Ok(Json(articles.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/article/{id}/",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 404, description = "Article not found", body = crate::errors::ErrorResponse)
    ),
    tag = "articles"
)]
pub async fn get_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ArticleResponse>, ApiError> {
    Ok(Json(state.catalog.get_article(Role::Public, id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/article/",
    request_body = NewArticle,
    responses(
        (status = 201, description = "Article created", body = ArticleResponse),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "articles"
)]
pub async fn create_article(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewArticle>,
) -> Result<Response, ApiError> {
    let created = state.catalog.create_article(payload).await?;
    Ok(created_response(ArticleResponse::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/article/{id}/",
    params(("id" = i32, Path, description = "Article ID")),
    request_body = NewArticle,
    responses(
        (status = 200, description = "Article replaced", body = ArticleResponse),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Article not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "articles"
)]
pub async fn replace_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<NewArticle>,
) -> Result<Response, ApiError> {
    let updated = state.catalog.update_article(id, payload.into()).await?;
    Ok(success_response(ArticleResponse::from(updated)))
}

#[utoipa::path(
    patch,
    path = "/api/article/{id}/",
    params(("id" = i32, Path, description = "Article ID")),
    request_body = ArticleChanges,
    responses(
        (status = 200, description = "Article updated", body = ArticleResponse),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Article not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "articles"
)]
pub async fn update_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ArticleChanges>,
) -> Result<Response, ApiError> {
    let updated = state.catalog.update_article(id, payload).await?;
    Ok(success_response(ArticleResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/article/{id}/",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Article deleted"),
        (status = 404, description = "Article not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "articles"
)]
pub async fn delete_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ApiError> {
    state.catalog.delete_article(id).await?;
    Ok(no_content_response())
}
