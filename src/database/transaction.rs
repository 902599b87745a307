use crate::config::DatabaseConfig;
use crate::database::DbPool;
use crate::error::{AppError, AppResult};
use sea_orm::{DatabaseTransaction, IsolationLevel, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;

/// Opens a transaction at `isolation`; `None` keeps the server default.
pub async fn begin(pool: &DbPool, isolation: Option<IsolationLevel>) -> AppResult<DatabaseTransaction> {
    let txn = pool.begin_with_config(isolation, None).await?;
    Ok(txn)
}

/// Explicit level wins, otherwise the one from `database.isolation_level`.
pub fn transaction_isolation(
    config: &DatabaseConfig,
    isolation: Option<IsolationLevel>,
) -> Option<IsolationLevel> {
    isolation.or_else(|| config.isolation())
}

/// Runs `callback` inside a single transaction.
///
/// Commits when the callback returns `Ok`, rolls back on `Err`. The callback's
/// own error is returned unchanged; connection failures surface as
/// `AppError::DatabaseError`. Without an explicit `isolation` the configured
/// level applies.
pub async fn run_in_transaction<F, T>(
    pool: &DbPool,
    config: &DatabaseConfig,
    isolation: Option<IsolationLevel>,
    callback: F,
) -> AppResult<T>
where
    F: for<'c> FnOnce(
            &'c DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'c>>
        + Send,
    T: Send,
{
    let isolation = transaction_isolation(config, isolation);
    pool.transaction_with_config::<F, T, AppError>(callback, isolation, None)
        .await
        .map_err(|e| match e {
            TransactionError::Connection(err) => AppError::DatabaseError(err),
            TransactionError::Transaction(err) => err,
        })
}
