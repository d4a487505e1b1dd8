/*!
 * Transaction Helper Utilities
 *
 * Runs a unit of work inside one database transaction: commit on `Ok`,
 * rollback on `Err`, with the caller's error type preserved.
 */

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, warn};

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// # Example
///
/// ```rust,ignore
/// let transition = with_transaction(&db, |txn| {
///     Box::pin(async move {
///         let category = category::Entity::find_by_id(id).one(txn).await?;
///         product::Entity::update_many()
///             .col_expr(product::Column::Active, Expr::value(false))
///             .exec(txn)
///             .await?;
///         Ok(category)
///     })
/// }).await?;
/// ```
pub async fn with_transaction<F, T, E>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a DatabaseTransaction) -> BoxFuture<'a, Result<T, E>>,
    E: From<DbErr>,
{
    let txn = db.begin().await?;

    match f(&txn).await {
        Ok(value) => {
            txn.commit().await?;
            debug!("transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                warn!("transaction rollback failed: {}", rollback_err);
            } else {
                debug!("transaction rolled back");
            }
            Err(err)
        }
    }
}
