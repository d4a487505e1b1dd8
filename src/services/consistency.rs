use crate::{
    db::{with_transaction, DbPool},
    entities::{article, category, product, timestamp_now},
    errors::ServiceError,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait,
    QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// What enabling a parent does to its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnableCascade {
    /// Children follow the parent and become active.
    #[default]
    Activate,
    /// Children are forced inactive even though the parent is enabled.
    Deactivate,
}

impl EnableCascade {
    fn child_flag(self) -> bool {
        matches!(self, EnableCascade::Activate)
    }
}

/// Outcome of an enable/disable call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub id: i32,
    pub active: bool,
    /// false when the entity was already in the requested state
    pub changed: bool,
    /// children rows touched by the bulk update
    pub cascaded: u64,
}

impl StateTransition {
    fn unchanged(id: i32, active: bool) -> Self {
        Self {
            id,
            active,
            changed: false,
            cascaded: 0,
        }
    }
}

/// Owns every write to the `active` flag of categories and products so the
/// parent flip and the children bulk update always commit together.
#[derive(Clone)]
pub struct ConsistencyService {
    db: Arc<DbPool>,
    enable_cascade: EnableCascade,
}

impl ConsistencyService {
    pub fn new(db: Arc<DbPool>, enable_cascade: EnableCascade) -> Self {
        Self { db, enable_cascade }
    }

    pub fn enable_cascade(&self) -> EnableCascade {
        self.enable_cascade
    }

    /// Deactivates a category and all of its products. Articles are left as they are.
    #[instrument(skip(self))]
    pub async fn disable_category(&self, id: i32) -> Result<StateTransition, ServiceError> {
        self.transition_category(id, false, false).await
    }

    #[instrument(skip(self))]
    pub async fn enable_category(&self, id: i32) -> Result<StateTransition, ServiceError> {
        let child_flag = self.enable_cascade.child_flag();
        self.transition_category(id, true, child_flag).await
    }

    /// Deactivates a product and all of its articles.
    #[instrument(skip(self))]
    pub async fn disable_product(&self, id: i32) -> Result<StateTransition, ServiceError> {
        self.transition_product(id, false, false).await
    }

    #[instrument(skip(self))]
    pub async fn enable_product(&self, id: i32) -> Result<StateTransition, ServiceError> {
        let child_flag = self.enable_cascade.child_flag();
        self.transition_product(id, true, child_flag).await
    }

    async fn transition_category(
        &self,
        id: i32,
        active: bool,
        child_flag: bool,
    ) -> Result<StateTransition, ServiceError> {
        let transition = with_transaction::<_, _, ServiceError>(&self.db, move |txn| {
            Box::pin(async move {
                let mut query = category::Entity::find_by_id(id);
                if txn.get_database_backend() == DbBackend::Postgres {
                    query = query.lock_exclusive();
                }
                let current = query
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Category {id} not found")))?;

                if current.active == active {
                    return Ok(StateTransition::unchanged(id, active));
                }

                let now = timestamp_now();
                let mut model: category::ActiveModel = current.into();
                model.active = Set(active);
                model.updated_at = Set(now);
                model.update(txn).await?;

                let cascaded = product::Entity::update_many()
                    .col_expr(product::Column::Active, Expr::value(child_flag))
                    .col_expr(product::Column::UpdatedAt, Expr::value(now))
                    .filter(product::Column::CategoryId.eq(id))
                    .exec(txn)
                    .await?
                    .rows_affected;

                Ok(StateTransition {
                    id,
                    active,
                    changed: true,
                    cascaded,
                })
            })
        })
        .await?;

        if transition.changed {
            info!(
                category_id = id,
                active,
                products_active = child_flag,
                cascaded = transition.cascaded,
                "category state changed"
            );
        }
        Ok(transition)
    }

    async fn transition_product(
        &self,
        id: i32,
        active: bool,
        child_flag: bool,
    ) -> Result<StateTransition, ServiceError> {
        let transition = with_transaction::<_, _, ServiceError>(&self.db, move |txn| {
            Box::pin(async move {
                let mut query = product::Entity::find_by_id(id);
                if txn.get_database_backend() == DbBackend::Postgres {
                    query = query.lock_exclusive();
                }
                let current = query
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))?;

                if current.active == active {
                    return Ok(StateTransition::unchanged(id, active));
                }

                let now = timestamp_now();
                let mut model: product::ActiveModel = current.into();
                model.active = Set(active);
                model.updated_at = Set(now);
                model.update(txn).await?;

                let cascaded = article::Entity::update_many()
                    .col_expr(article::Column::Active, Expr::value(child_flag))
                    .col_expr(article::Column::UpdatedAt, Expr::value(now))
                    .filter(article::Column::ProductId.eq(id))
                    .exec(txn)
                    .await?
                    .rows_affected;

                Ok(StateTransition {
                    id,
                    active,
                    changed: true,
                    cascaded,
                })
            })
        })
        .await?;

        if transition.changed {
            info!(
                product_id = id,
                active,
                articles_active = child_flag,
                cascaded = transition.cascaded,
                "product state changed"
            );
        }
        Ok(transition)
    }
}
