//! Database layer using SeaORM.
//!
//! Query methods live on [`DbPool`] and are split per aggregate into the
//! submodules below. Multi-statement mutations run in one transaction via
//! [`finalize_transaction`].

pub mod groups;
pub mod releases;
pub mod reports;
pub mod test_cases;
pub mod test_plans;
pub mod test_points;
pub mod test_runs;
pub mod users;

use std::time::Duration;

use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Shared database handle.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect to the database at `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> AppResult<Self> {
        let mut opts = ConnectOptions::new(database_url.to_string());
        opts.max_connections(max_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(Self { conn })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply all pending schema migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(self.connection(), None)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Check that the database answers.
    pub async fn ping(&self) -> AppResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))
    }

    pub(crate) async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.conn
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))
    }
}

/// Commit on success, roll back on error, and hand back the result.
pub(crate) async fn finalize_transaction<T>(
    txn: DatabaseTransaction,
    result: AppResult<T>,
) -> AppResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit transaction: {}", e))
            })?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Failed to roll back transaction: {}", rollback_err);
            }
            Err(err)
        }
    }
}

/// Map a driver error to [`AppError::Database`] with context.
pub(crate) fn db_err(context: &'static str) -> impl Fn(sea_orm::DbErr) -> AppError {
    move |e| AppError::Database(format!("Failed to {}: {}", context, e))
}
