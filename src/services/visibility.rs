//! Visibility policy: which rows a caller may see for a given action.
//!
//! Every read in the catalog goes through [`Visibility::visible_set`], so the
//! role/action matrix lives in one place instead of being spread over handlers.

use crate::entities::{article, category, product};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Select,
};

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Public,
    Admin,
}

/// What the caller is doing with the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    /// `disable` / `able`: must reach inactive rows too
    StateChange,
}

/// Optional filters for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilters {
    pub category_id: Option<i32>,
}

/// Optional filters for article listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleFilters {
    pub active: Option<bool>,
}

pub trait Visibility: EntityTrait {
    type Filters: Default;

    /// Base query for `role` performing `action`, ordered by id.
    fn visible_set(role: Role, action: Action, filters: &Self::Filters) -> Select<Self>;
}

impl Visibility for category::Entity {
    type Filters = ();

    fn visible_set(role: Role, action: Action, _filters: &()) -> Select<Self> {
        let query = category::Entity::find().order_by_asc(category::Column::Id);
        match (role, action) {
            (Role::Public, Action::List) => query.filter(category::Column::Active.eq(true)),
            _ => query,
        }
    }
}

impl Visibility for product::Entity {
    type Filters = ProductFilters;

    fn visible_set(role: Role, action: Action, filters: &ProductFilters) -> Select<Self> {
        let mut query = product::Entity::find().order_by_asc(product::Column::Id);

        if role == Role::Public && action != Action::StateChange {
            query = query.filter(product::Column::Active.eq(true));
        }
        if action != Action::StateChange {
            if let Some(category_id) = filters.category_id {
                query = query.filter(product::Column::CategoryId.eq(category_id));
            }
        }

        query
    }
}

impl Visibility for article::Entity {
    type Filters = ArticleFilters;

    fn visible_set(_role: Role, _action: Action, filters: &ArticleFilters) -> Select<Self> {
        let query = article::Entity::find().order_by_asc(article::Column::Id);
        match filters.active {
            Some(active) => query.filter(article::Column::Active.eq(active)),
            None => query,
        }
    }
}

/// Reads the `active` query parameter: `true`/`false` in any case, anything
/// else means "no filter".
pub fn parse_active_flag(raw: Option<&str>) -> Option<bool> {
    match raw {
        Some(value) if value.eq_ignore_ascii_case("true") => Some(true),
        Some(value) if value.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Active products of the given categories, ordered by id.
pub async fn active_products_of<C>(
    db: &C,
    category_ids: &[i32],
) -> Result<Vec<product::Model>, DbErr>
where
    C: ConnectionTrait,
{
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }
    product::Entity::find()
        .filter(product::Column::CategoryId.is_in(category_ids.iter().copied()))
        .filter(product::Column::Active.eq(true))
        .order_by_asc(product::Column::Id)
        .all(db)
        .await
}

/// Active articles of the given products, ordered by id.
pub async fn active_articles_of<C>(
    db: &C,
    product_ids: &[i32],
) -> Result<Vec<article::Model>, DbErr>
where
    C: ConnectionTrait,
{
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }
    article::Entity::find()
        .filter(article::Column::ProductId.is_in(product_ids.iter().copied()))
        .filter(article::Column::Active.eq(true))
        .order_by_asc(article::Column::Id)
        .all(db)
        .await
}
