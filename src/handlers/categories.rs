use crate::{
    entities::category,
    errors::ApiError,
    handlers::{
        common::{
            created_response, no_content_response, success_response, timestamp, ApiJson,
            ApiPath, StateChangeResponse,
        },
        products::ProductResponse,
    },
    services::{
        catalog::{CategoryChanges, CategoryWithProducts, NewCategory},
        Role,
    },
    AppState,
};
use axum::{
    extract::State,
    response::{Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Public list shape
#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "Fruits",
    "created_at": "2024-01-31T09:15:00.123456Z",
    "updated_at": "2024-01-31T09:15:00.123456Z"
}))]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    #[serde(serialize_with = "timestamp::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::serialize")]
    pub updated_at: DateTime<Utc>,
}

impl From<category::Model> for CategorySummary {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Admin list and write shape
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminCategory {
    pub id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::serialize")]
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub description: String,
}

impl From<category::Model> for AdminCategory {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            name: model.name,
            description: model.description,
        }
    }
}

/// Detail shape: the category with its active products
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryDetail {
    pub id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::serialize")]
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub products: Vec<ProductResponse>,
}

impl From<CategoryWithProducts> for CategoryDetail {
    fn from(detail: CategoryWithProducts) -> Self {
        Self {
            id: detail.category.id,
            created_at: detail.category.created_at,
            updated_at: detail.category.updated_at,
            name: detail.category.name,
            products: detail.products.into_iter().map(Into::into).collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/category/",
    responses(
        (status = 200, description = "Active categories", body = [CategorySummary])
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let categories = state.catalog.list_categories(Role::Public).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/category/{id}/",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category with its active products", body = CategoryDetail),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<CategoryDetail>, ApiError> {
    let detail = state.catalog.category_detail(Role::Public, id).await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/api/category/{id}/disable/",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category and its products deactivated", body = StateChangeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn disable_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<StateChangeResponse>, ApiError> {
    let transition = state.consistency.disable_category(id).await?;
    Ok(Json(transition.into()))
}

#[utoipa::path(
    post,
    path = "/api/category/{id}/able/",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category activated, products follow the cascade policy", body = StateChangeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "categories"
)]
pub async fn enable_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<StateChangeResponse>, ApiError> {
    let transition = state.consistency.enable_category(id).await?;
    Ok(Json(transition.into()))
}

// ----- admin -----

#[utoipa::path(
    get,
    path = "/api/admin/category/",
    responses(
        (status = 200, description = "All categories", body = [AdminCategory])
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminCategory>>, ApiError> {
    let categories = state.catalog.list_categories(Role::Admin).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/admin/category/{id}/",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category with its active products", body = CategoryDetail),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<CategoryDetail>, ApiError> {
    let detail = state.catalog.category_detail(Role::Admin, id).await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/category/",
    request_body = NewCategory,
    responses(
        (status = 201, description = "Category created", body = AdminCategory),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_create_category(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewCategory>,
) -> Result<Response, ApiError> {
    let created = state.catalog.create_category(payload).await?;
    Ok(created_response(AdminCategory::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/admin/category/{id}/",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = NewCategory,
    responses(
        (status = 200, description = "Category replaced", body = AdminCategory),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_replace_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<NewCategory>,
) -> Result<Response, ApiError> {
    let updated = state.catalog.update_category(id, payload.into()).await?;
    Ok(success_response(AdminCategory::from(updated)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/category/{id}/",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryChanges,
    responses(
        (status = 200, description = "Category updated", body = AdminCategory),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CategoryChanges>,
) -> Result<Response, ApiError> {
    let updated = state.catalog.update_category(id, payload).await?;
    Ok(success_response(AdminCategory::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/category/{id}/",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category and its descendants deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ApiError> {
    state.catalog.delete_category(id).await?;
    Ok(no_content_response())
}
