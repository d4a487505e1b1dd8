use crate::{
    entities::product,
    errors::ApiError,
    handlers::{
        articles::ArticleResponse,
        common::{
            created_response, no_content_response, success_response, timestamp, ApiJson,
            ApiPath, StateChangeResponse,
        },
    },
    services::{
        catalog::{NewProduct, ProductChanges, ProductWithArticles},
        visibility::ProductFilters,
        Role,
    },
    AppState,
};
use axum::{
    extract::{Query, State},
    response::{Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Only products of this category
    pub category_id: Option<String>,
}

impl ProductListQuery {
    fn filters(&self) -> Result<ProductFilters, ApiError> {
        let category_id = match self.category_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<i32>().map_err(|_| ApiError::BadRequest {
                message: format!("category_id must be an integer, got \"{raw}\""),
            })?),
        };
        Ok(ProductFilters { category_id })
    }
}

/// Public product shape with active articles
#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 4,
    "created_at": "2024-01-31T09:15:00.123456Z",
    "updated_at": "2024-01-31T09:15:00.123456Z",
    "name": "Apple",
    "category": 1,
    "articles": [],
    "ecoscore": "b"
}))]
pub struct ProductResponse {
    pub id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::serialize")]
    pub updated_at: DateTime<Utc>,
    pub name: String,
    /// Owning category id
    pub category: i32,
    pub articles: Vec<ArticleResponse>,
    /// Open Food Facts grade; omitted when the lookup did not succeed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecoscore: Option<String>,
}

impl From<ProductWithArticles> for ProductResponse {
    fn from(nested: ProductWithArticles) -> Self {
        let product = nested.product;
        Self {
            id: product.id,
            created_at: product.created_at,
            updated_at: product.updated_at,
            name: product.name,
            category: product.category_id,
            articles: nested.articles.into_iter().map(Into::into).collect(),
            ecoscore: nested.ecoscore,
        }
    }
}

/// Admin shape: flat, includes description and state
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminProduct {
    pub id: i32,
    #[serde(serialize_with = "timestamp::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::serialize")]
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub category: i32,
}

impl From<product::Model> for AdminProduct {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            name: model.name,
            description: model.description,
            active: model.active,
            category: model.category_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/product/",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Active products with their active articles", body = [ProductResponse]),
        (status = 400, description = "category_id is not an integer", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.product_listing(query.filters()?).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/product/{id}/",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Active product", body = ProductResponse),
        (status = 404, description = "Product not found or inactive", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ProductResponse>, ApiError> {
    Ok(Json(state.catalog.product_detail(id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/product/{id}/disable/",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product and its articles deactivated", body = StateChangeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn disable_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<StateChangeResponse>, ApiError> {
    Ok(Json(state.consistency.disable_product(id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/product/{id}/able/",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product activated, articles follow the cascade policy", body = StateChangeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "products"
)]
pub async fn enable_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<StateChangeResponse>, ApiError> {
    Ok(Json(state.consistency.enable_product(id).await?.into()))
}

// ----- admin -----

#[utoipa::path(
    get,
    path = "/api/admin/product/",
    params(ProductListQuery),
    responses(
        (status = 200, description = "All products", body = [AdminProduct])
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<AdminProduct>>, ApiError> {
    let products = state
        .catalog
        .list_products(Role::Admin, query.filters()?)
        .await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/admin/product/{id}/",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = AdminProduct),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<AdminProduct>, ApiError> {
    Ok(Json(state.catalog.get_product(Role::Admin, id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/product/",
    request_body = NewProduct,
    responses(
        (status = 201, description = "Product created (inactive)", body = AdminProduct),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_create_product(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewProduct>,
) -> Result<Response, ApiError> {
    let created = state.catalog.create_product(payload).await?;
    Ok(created_response(AdminProduct::from(created)))
}

#[utoipa::path(
    put,
    path = "/api/admin/product/{id}/",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = NewProduct,
    responses(
        (status = 200, description = "Product replaced", body = AdminProduct),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_replace_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<NewProduct>,
) -> Result<Response, ApiError> {
    let updated = state.catalog.update_product(id, payload.into()).await?;
    Ok(success_response(AdminProduct::from(updated)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/product/{id}/",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = ProductChanges,
    responses(
        (status = 200, description = "Product updated", body = AdminProduct),
        (status = 400, description = "Invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_update_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ProductChanges>,
) -> Result<Response, ApiError> {
    let updated = state.catalog.update_product(id, payload).await?;
    Ok(success_response(AdminProduct::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/product/{id}/",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product and its articles deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn admin_delete_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ApiError> {
    state.catalog.delete_product(id).await?;
    Ok(no_content_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn query(raw: Option<&str>) -> ProductListQuery {
        ProductListQuery {
            category_id: raw.map(str::to_string),
        }
    }

    #[test]
    fn category_filter_parsing() {
        assert_eq!(query(None).filters().unwrap().category_id, None);
        assert_eq!(query(Some("")).filters().unwrap().category_id, None);
        assert_eq!(query(Some("7")).filters().unwrap().category_id, Some(7));
        assert_matches!(
            query(Some("seven")).filters(),
            Err(ApiError::BadRequest { .. })
        );
    }
}
