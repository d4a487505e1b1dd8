use crate::{
    db::DbPool,
    entities::{article, category, product},
    errors::ServiceError,
    services::{
        ecoscore::EcoscoreProvider,
        validation::{
            category_exists, category_inactive, check_name_in_description, does_not_exist,
            into_result, product_inactive, validate_price,
        },
        visibility::{
            active_articles_of, active_products_of, Action, ArticleFilters, ProductFilters, Role,
            Visibility,
        },
    },
};
use futures::future::join_all;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

/// Payload for creating (or fully replacing) a category.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewCategory {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Partial category update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CategoryChanges {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<NewCategory> for CategoryChanges {
    fn from(input: NewCategory) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewProduct {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Owning category id
    pub category: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProductChanges {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<i32>,
}

impl From<NewProduct> for ProductChanges {
    fn from(input: NewProduct) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            category: Some(input.category),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewArticle {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "2.50")]
    pub price: Decimal,
    /// Owning product id; the product must be active
    pub product: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ArticleChanges {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    #[schema(value_type = Option<String>, example = "2.50")]
    pub price: Option<Decimal>,
    pub product: Option<i32>,
}

impl From<NewArticle> for ArticleChanges {
    fn from(input: NewArticle) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            price: Some(input.price),
            product: Some(input.product),
        }
    }
}

/// A product together with its active articles.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductWithArticles {
    pub product: product::Model,
    pub articles: Vec<article::Model>,
    pub ecoscore: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWithProducts {
    pub category: category::Model,
    pub products: Vec<ProductWithArticles>,
}

fn starting_errors<T: Validate>(input: &T) -> ValidationErrors {
    input.validate().err().unwrap_or_else(ValidationErrors::new)
}

fn category_write_error(err: DbErr) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            let mut errors = ValidationErrors::new();
            errors.add("name", category_exists());
            ServiceError::InvalidFields(errors)
        }
        _ => ServiceError::DatabaseError(err),
    }
}

/// Reads and writes for the catalog hierarchy. State transitions live in
/// [`ConsistencyService`](super::ConsistencyService).
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
    ecoscore: Arc<dyn EcoscoreProvider>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>, ecoscore: Arc<dyn EcoscoreProvider>) -> Self {
        Self { db, ecoscore }
    }

    // ----- categories -----

    #[instrument(skip(self))]
    pub async fn list_categories(&self, role: Role) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::visible_set(role, Action::List, &())
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, role: Role, id: i32) -> Result<category::Model, ServiceError> {
        category::Entity::visible_set(role, Action::Retrieve, &())
            .filter(category::Column::Id.eq(id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {id} not found")))
    }

    /// Category with its active products, each carrying its active articles.
    #[instrument(skip(self))]
    pub async fn category_detail(
        &self,
        role: Role,
        id: i32,
    ) -> Result<CategoryWithProducts, ServiceError> {
        let category = self.get_category(role, id).await?;
        let products = active_products_of(&*self.db, &[category.id]).await?;
        let products = self.attach_articles(products).await?;

        Ok(CategoryWithProducts {
            category,
            products: products
                .into_iter()
                .map(|(product, articles)| ProductWithArticles {
                    product,
                    articles,
                    ecoscore: None,
                })
                .collect(),
        })
    }

    #[instrument(skip(self, input))]
    pub async fn create_category(&self, input: NewCategory) -> Result<category::Model, ServiceError> {
        let mut errors = starting_errors(&input);
        if !errors.field_errors().contains_key("name")
            && self.category_name_taken(&input.name, None).await?
        {
            errors.add("name", category_exists());
        }
        if let Err(e) = check_name_in_description(&input.name, &input.description) {
            errors.add("description", e);
        }
        into_result(errors)?;

        let created = category::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(category_write_error)?;

        info!(category_id = created.id, name = %created.name, "category created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_category(
        &self,
        id: i32,
        changes: CategoryChanges,
    ) -> Result<category::Model, ServiceError> {
        let existing = self.get_category(Role::Admin, id).await?;

        let mut errors = starting_errors(&changes);
        let name = changes.name.clone().unwrap_or_else(|| existing.name.clone());
        let description = changes
            .description
            .clone()
            .unwrap_or_else(|| existing.description.clone());

        if changes.name.is_some()
            && !errors.field_errors().contains_key("name")
            && self.category_name_taken(&name, Some(id)).await?
        {
            errors.add("name", category_exists());
        }
        if let Err(e) = check_name_in_description(&name, &description) {
            errors.add("description", e);
        }
        into_result(errors)?;

        let mut model: category::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(description) = changes.description {
            model.description = Set(description);
        }
        let updated = model.update(&*self.db).await.map_err(category_write_error)?;

        info!(category_id = id, "category updated");
        Ok(updated)
    }

    /// Deletes a category; its products and their articles go with it.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<(), ServiceError> {
        let result = category::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Category {id} not found")));
        }
        info!(category_id = id, "category deleted");
        Ok(())
    }

    async fn category_name_taken(
        &self,
        name: &str,
        except: Option<i32>,
    ) -> Result<bool, ServiceError> {
        let mut query = category::Entity::find().filter(category::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(category::Column::Id.ne(id));
        }
        Ok(query.count(&*self.db).await? > 0)
    }

    // ----- products -----

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        role: Role,
        filters: ProductFilters,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::visible_set(role, Action::List, &filters)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, role: Role, id: i32) -> Result<product::Model, ServiceError> {
        product::Entity::visible_set(role, Action::Retrieve, &ProductFilters::default())
            .filter(product::Column::Id.eq(id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    /// Public product listing: active products with active articles and ecoscore.
    #[instrument(skip(self))]
    pub async fn product_listing(
        &self,
        filters: ProductFilters,
    ) -> Result<Vec<ProductWithArticles>, ServiceError> {
        let products = self.list_products(Role::Public, filters).await?;
        let products = self.attach_articles(products).await?;
        Ok(self.attach_ecoscore(products).await)
    }

    #[instrument(skip(self))]
    pub async fn product_detail(&self, id: i32) -> Result<ProductWithArticles, ServiceError> {
        let product = self.get_product(Role::Public, id).await?;
        let products = self.attach_articles(vec![product]).await?;
        self.attach_ecoscore(products)
            .await
            .pop()
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        let mut errors = starting_errors(&input);
        self.check_category_reference(input.category, &mut errors).await?;
        into_result(errors)?;

        let created = product::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            category_id: Set(input.category),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = created.id, category_id = created.category_id, "product created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_product(
        &self,
        id: i32,
        changes: ProductChanges,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(Role::Admin, id).await?;

        let mut errors = starting_errors(&changes);
        if let Some(category_id) = changes.category {
            let target = self.check_category_reference(category_id, &mut errors).await?;
            // An active product may only move under an active category.
            if let Some(target) = target {
                if existing.active && !target.active && target.id != existing.category_id {
                    errors.add("category", category_inactive());
                }
            }
        }
        into_result(errors)?;

        let mut model: product::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(description) = changes.description {
            model.description = Set(description);
        }
        if let Some(category_id) = changes.category {
            model.category_id = Set(category_id);
        }
        let updated = model.update(&*self.db).await?;

        info!(product_id = id, "product updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let result = product::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Product {id} not found")));
        }
        info!(product_id = id, "product deleted");
        Ok(())
    }

    async fn check_category_reference(
        &self,
        category_id: i32,
        errors: &mut ValidationErrors,
    ) -> Result<Option<category::Model>, ServiceError> {
        let found = category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?;
        if found.is_none() {
            errors.add("category", does_not_exist(category_id));
        }
        Ok(found)
    }

    // ----- articles -----

    #[instrument(skip(self))]
    pub async fn list_articles(
        &self,
        role: Role,
        filters: ArticleFilters,
    ) -> Result<Vec<article::Model>, ServiceError> {
        Ok(article::Entity::visible_set(role, Action::List, &filters)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_article(&self, role: Role, id: i32) -> Result<article::Model, ServiceError> {
        article::Entity::visible_set(role, Action::Retrieve, &ArticleFilters::default())
            .filter(article::Column::Id.eq(id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Article {id} not found")))
    }

    #[instrument(skip(self, input))]
    pub async fn create_article(&self, input: NewArticle) -> Result<article::Model, ServiceError> {
        let mut errors = starting_errors(&input);
        self.check_product_reference(input.product, &mut errors).await?;
        into_result(errors)?;

        let created = article::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price),
            product_id: Set(input.product),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(article_id = created.id, product_id = created.product_id, "article created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_article(
        &self,
        id: i32,
        changes: ArticleChanges,
    ) -> Result<article::Model, ServiceError> {
        let existing = self.get_article(Role::Admin, id).await?;

        let mut errors = starting_errors(&changes);
        if let Some(product_id) = changes.product {
            self.check_product_reference(product_id, &mut errors).await?;
        }
        into_result(errors)?;

        let mut model: article::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            model.name = Set(name);
        }
        if let Some(description) = changes.description {
            model.description = Set(description);
        }
        if let Some(price) = changes.price {
            model.price = Set(price);
        }
        if let Some(product_id) = changes.product {
            model.product_id = Set(product_id);
        }
        let updated = model.update(&*self.db).await?;

        info!(article_id = id, "article updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_article(&self, id: i32) -> Result<(), ServiceError> {
        let result = article::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Article {id} not found")));
        }
        info!(article_id = id, "article deleted");
        Ok(())
    }

    async fn check_product_reference(
        &self,
        product_id: i32,
        errors: &mut ValidationErrors,
    ) -> Result<(), ServiceError> {
        match product::Entity::find_by_id(product_id).one(&*self.db).await? {
            None => errors.add("product", does_not_exist(product_id)),
            Some(product) if !product.active => errors.add("product", product_inactive()),
            Some(_) => {}
        }
        Ok(())
    }

    // ----- nesting -----

    async fn attach_articles(
        &self,
        products: Vec<product::Model>,
    ) -> Result<Vec<(product::Model, Vec<article::Model>)>, ServiceError> {
        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
        let mut by_product: HashMap<i32, Vec<article::Model>> = HashMap::new();
        for article in active_articles_of(&*self.db, &ids).await? {
            by_product.entry(article.product_id).or_default().push(article);
        }

        Ok(products
            .into_iter()
            .map(|product| {
                let articles = by_product.remove(&product.id).unwrap_or_default();
                (product, articles)
            })
            .collect())
    }

    async fn attach_ecoscore(
        &self,
        products: Vec<(product::Model, Vec<article::Model>)>,
    ) -> Vec<ProductWithArticles> {
        let grades = join_all(
            products
                .iter()
                .map(|(product, _)| self.ecoscore.fetch_grade(product)),
        )
        .await;

        products
            .into_iter()
            .zip(grades)
            .map(|((product, articles), ecoscore)| ProductWithArticles {
                product,
                articles,
                ecoscore,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::sqlite_pool;
    use crate::services::ecoscore::{DisabledEcoscore, MockEcoscoreProvider};
    use crate::services::validation::{
        CATEGORY_EXISTS, CATEGORY_MUST_BE_ACTIVE, NAME_NOT_IN_DESCRIPTION, PRICE_MINIMUM,
        PRODUCT_MUST_BE_ACTIVE,
    };
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;
    use sea_orm::DatabaseConnection;
    use tempfile::TempDir;

    async fn service() -> (CatalogService, DatabaseConnection, TempDir) {
        let (db, dir) = sqlite_pool().await;
        let service = CatalogService::new(Arc::new(db.clone()), Arc::new(DisabledEcoscore));
        (service, db, dir)
    }

    async fn seed_category(db: &DatabaseConnection, name: &str, active: bool) -> category::Model {
        category::ActiveModel {
            name: Set(name.into()),
            description: Set(format!("All about {name}")),
            active: Set(active),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn seed_product(
        db: &DatabaseConnection,
        category_id: i32,
        name: &str,
        active: bool,
    ) -> product::Model {
        product::ActiveModel {
            name: Set(name.into()),
            description: Set(String::new()),
            active: Set(active),
            category_id: Set(category_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn seed_article(
        db: &DatabaseConnection,
        product_id: i32,
        name: &str,
        active: bool,
    ) -> article::Model {
        article::ActiveModel {
            name: Set(name.into()),
            description: Set(String::new()),
            active: Set(active),
            price: Set(dec!(3.20)),
            product_id: Set(product_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    fn messages(err: ServiceError, field: &str) -> Vec<String> {
        match err {
            ServiceError::InvalidFields(errors) => crate::errors::field_messages(&errors)
                .remove(field)
                .unwrap_or_default(),
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn category_create_checks_uniqueness_and_description() {
        let (service, db, _dir) = service().await;
        seed_category(&db, "Fruits", true).await;

        let err = service
            .create_category(NewCategory {
                name: "Fruits".into(),
                description: "Fruits again".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(messages(err, "name"), vec![CATEGORY_EXISTS]);

        let err = service
            .create_category(NewCategory {
                name: "Légumes".into(),
                description: "Green things".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(messages(err, "description"), vec![NAME_NOT_IN_DESCRIPTION]);

        let created = service
            .create_category(NewCategory {
                name: "Légumes".into(),
                description: "Fresh Légumes".into(),
            })
            .await
            .unwrap();
        assert!(!created.active);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn partial_category_update_checks_against_stored_values() {
        let (service, db, _dir) = service().await;
        let fruits = seed_category(&db, "Fruits", true).await;

        let err = service
            .update_category(
                fruits.id,
                CategoryChanges {
                    name: Some("Berries".into()),
                    description: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(messages(err, "description"), vec![NAME_NOT_IN_DESCRIPTION]);

        let updated = service
            .update_category(
                fruits.id,
                CategoryChanges {
                    name: None,
                    description: Some("Seasonal Fruits".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Fruits");
        assert_eq!(updated.description, "Seasonal Fruits");
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn article_price_and_product_rules() {
        let (service, db, _dir) = service().await;
        let category = seed_category(&db, "Fruits", true).await;
        let active = seed_product(&db, category.id, "Apple", true).await;
        let inactive = seed_product(&db, category.id, "Pear", false).await;

        let input = |product: i32, price: Decimal| NewArticle {
            name: "Bag".into(),
            description: String::new(),
            price,
            product,
        };

        let err = service.create_article(input(active.id, dec!(0.99))).await.unwrap_err();
        assert_eq!(messages(err, "price"), vec![PRICE_MINIMUM]);

        let err = service.create_article(input(inactive.id, dec!(5))).await.unwrap_err();
        assert_eq!(messages(err, "product"), vec![PRODUCT_MUST_BE_ACTIVE]);

        let err = service.create_article(input(999, dec!(5))).await.unwrap_err();
        assert_eq!(
            messages(err, "product"),
            vec!["Invalid pk \"999\" - object does not exist."]
        );

        let created = service.create_article(input(active.id, dec!(1.00))).await.unwrap();
        assert_eq!(created.price, dec!(1.00));
        assert!(!created.active);
    }

    #[tokio::test]
    async fn article_writes_cannot_reactivate_under_a_disabled_product() {
        let (service, db, _dir) = service().await;
        let category = seed_category(&db, "Fruits", true).await;
        let apple = seed_product(&db, category.id, "Apple", true).await;
        let bag = seed_article(&db, apple.id, "Apple 1kg", true).await;

        let consistency = crate::services::ConsistencyService::new(
            Arc::new(db.clone()),
            crate::services::EnableCascade::Activate,
        );
        consistency.disable_product(apple.id).await.unwrap();

        let changes: ArticleChanges =
            serde_json::from_value(serde_json::json!({ "active": true, "price": "3.50" }))
                .unwrap();
        let updated = service.update_article(bag.id, changes).await.unwrap();
        assert_eq!(updated.price, dec!(3.50));
        assert!(!updated.active);

        let stored = article::Entity::find_by_id(bag.id).one(&db).await.unwrap().unwrap();
        assert!(!stored.active);
        let product = product::Entity::find_by_id(apple.id).one(&db).await.unwrap().unwrap();
        assert!(!product.active);
    }

    #[tokio::test]
    async fn active_product_cannot_move_into_an_inactive_category() {
        let (service, db, _dir) = service().await;
        let on = seed_category(&db, "On", true).await;
        let off = seed_category(&db, "Off", false).await;
        let apple = seed_product(&db, on.id, "Apple", true).await;
        let quince = seed_product(&db, on.id, "Quince", false).await;

        let err = service
            .update_product(
                apple.id,
                ProductChanges {
                    category: Some(off.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(messages(err, "category"), vec![CATEGORY_MUST_BE_ACTIVE]);

        let stored = product::Entity::find_by_id(apple.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.category_id, on.id);
        assert!(stored.active);

        let listed = service
            .list_products(
                Role::Public,
                ProductFilters {
                    category_id: Some(off.id),
                },
            )
            .await
            .unwrap();
        assert!(listed.is_empty());

        // Inactive products may be filed anywhere.
        let moved = service
            .update_product(
                quince.id,
                ProductChanges {
                    category: Some(off.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.category_id, off.id);
        assert!(!moved.active);
    }

    #[tokio::test]
    async fn product_listing_nests_active_articles_and_ecoscore() {
        let (db, _dir) = sqlite_pool().await;
        let category = seed_category(&db, "Fruits", true).await;
        let apple = seed_product(&db, category.id, "Apple", true).await;
        seed_product(&db, category.id, "Hidden", false).await;
        let shown = seed_article(&db, apple.id, "Apple 1kg", true).await;
        seed_article(&db, apple.id, "Apple 5kg", false).await;

        let mut ecoscore = MockEcoscoreProvider::new();
        ecoscore
            .expect_fetch_grade()
            .times(1)
            .returning(|_| Some("a".to_string()));
        let service = CatalogService::new(Arc::new(db), Arc::new(ecoscore));

        let listing = service
            .product_listing(ProductFilters::default())
            .await
            .unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].product.id, apple.id);
        assert_eq!(listing[0].articles, vec![shown]);
        assert_eq!(listing[0].ecoscore.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn category_detail_skips_inactive_children_and_ecoscore() {
        let (db, _dir) = sqlite_pool().await;
        let category = seed_category(&db, "Légumes", false).await;
        let leek = seed_product(&db, category.id, "Leek", true).await;
        seed_product(&db, category.id, "Onion", false).await;

        let mut ecoscore = MockEcoscoreProvider::new();
        ecoscore.expect_fetch_grade().never();
        let service = CatalogService::new(Arc::new(db), Arc::new(ecoscore));

        let detail = service.category_detail(Role::Public, category.id).await.unwrap();
        assert_eq!(detail.category.id, category.id);
        assert_eq!(detail.products.len(), 1);
        assert_eq!(detail.products[0].product.id, leek.id);
        assert_eq!(detail.products[0].ecoscore, None);
    }

    #[tokio::test]
    async fn deleting_a_category_removes_descendants() {
        let (service, db, _dir) = service().await;
        let category = seed_category(&db, "Fruits", true).await;
        let apple = seed_product(&db, category.id, "Apple", true).await;
        seed_article(&db, apple.id, "Apple 1kg", true).await;

        service.delete_category(category.id).await.unwrap();
        assert_eq!(product::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(article::Entity::find().count(&db).await.unwrap(), 0);

        assert_matches!(
            service.delete_category(category.id).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn product_create_requires_an_existing_category() {
        let (service, db, _dir) = service().await;
        let err = service
            .create_product(NewProduct {
                name: "Apple".into(),
                description: String::new(),
                category: 12,
            })
            .await
            .unwrap_err();
        assert_eq!(
            messages(err, "category"),
            vec!["Invalid pk \"12\" - object does not exist."]
        );

        let category = seed_category(&db, "Fruits", true).await;
        let created = service
            .create_product(NewProduct {
                name: "Apple".into(),
                description: String::new(),
                category: category.id,
            })
            .await
            .unwrap();
        assert!(!created.active);
    }
}
