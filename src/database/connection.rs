use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(config.sqlx_logging)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let pool = Database::connect(opt).await?;
    Ok(pool)
}

/// Applies pending migrations and returns how many were applied.
pub async fn run_migrations(pool: &DbPool) -> AppResult<usize> {
    let pending = Migrator::get_pending_migrations(pool).await?.len();
    if pending > 0 {
        log::info!("Applying {pending} pending migration(s)");
        Migrator::up(pool, None).await?;
    }
    Ok(pending)
}

/// Single-connection in-memory SQLite: every `:memory:` connection is its
/// own database.
#[cfg(test)]
pub(crate) fn test_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        connect_timeout_secs: 8,
        sqlx_logging: false,
        isolation_level: None,
    }
}

/// In-memory SQLite database with the full schema applied.
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let pool = create_pool(&test_config()).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = test_pool().await;
        assert_eq!(run_migrations(&pool).await.unwrap(), 0);
        assert!(Migrator::get_pending_migrations(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_down_then_up() {
        let pool = test_pool().await;
        Migrator::down(&pool, None).await.unwrap();
        assert_eq!(Migrator::get_pending_migrations(&pool).await.unwrap().len(), 3);
        assert_eq!(run_migrations(&pool).await.unwrap(), 3);
    }
}
