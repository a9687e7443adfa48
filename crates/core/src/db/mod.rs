//! Database layer for AskArxiv
//!
//! Provides:
//! - The `Database` lifecycle contract (startup, shutdown, scoped sessions)
//! - The `Repository` CRUD contract
//! - SeaORM entity models and adapters
//! - An in-memory adapter for tests and embedded use

pub mod memory;
pub mod models;
mod repository;

pub use memory::{MemoryDatabase, MemoryPaperRepository, MemorySession};
pub use repository::{Page, PaperRepository, RecordData, Repository};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, DatabaseConnection, DatabaseTransaction, TransactionTrait,
};
use tokio::sync::RwLock;
use tracing::info;

/// Lifecycle contract a concrete database adapter must implement
///
/// A session is a scoped unit of work: it is acquired through
/// [`Database::get_session`] and releases its resources when dropped,
/// on every exit path. Pooling, isolation level, and retry policy are
/// adapter concerns.
#[async_trait]
pub trait Database: Send + Sync {
    /// The scoped session handle this adapter yields
    type Session: Send;

    /// Establish the connection or engine
    async fn startup(&self) -> Result<()>;

    /// Release the connection
    ///
    /// Safe to call after a successful `startup`, and a no-op when
    /// nothing is connected.
    async fn shutdown(&self) -> Result<()>;

    /// Acquire a scoped session
    async fn get_session(&self) -> Result<Self::Session>;
}

/// SeaORM-backed database adapter
///
/// `startup` builds the connection pool from [`DatabaseConfig`]; a repeated
/// `startup` replaces the previous pool. Sessions are database transactions:
/// dropping one without committing rolls it back.
pub struct SeaOrmDatabase {
    config: DatabaseConfig,
    conn: RwLock<Option<DatabaseConnection>>,
}

impl SeaOrmDatabase {
    /// Create an adapter from configuration without connecting
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            conn: RwLock::new(None),
        }
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        let guard = self.conn.read().await;
        let conn = guard.as_ref().ok_or_else(not_connected)?;

        conn.execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;

        Ok(())
    }
}

#[async_trait]
impl Database for SeaOrmDatabase {
    type Session = DatabaseTransaction;

    async fn startup(&self) -> Result<()> {
        info!("Connecting to database...");

        let mut opts = ConnectOptions::new(&self.config.url);
        opts.max_connections(self.config.max_connections)
            .min_connections(self.config.min_connections)
            .connect_timeout(self.config.connect_timeout())
            .idle_timeout(self.config.idle_timeout())
            .sqlx_logging(true);

        let conn = sea_orm::Database::connect(opts).await.map_err(|e| {
            AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            }
        })?;

        let previous = self.conn.write().await.replace(conn);
        if let Some(previous) = previous {
            previous
                .close()
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Failed to close previous connection: {}", e),
                })?;
        }

        info!("Database connection established");
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        let conn = self.conn.write().await.take();

        if let Some(conn) = conn {
            conn.close()
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Failed to close connection: {}", e),
                })?;
            info!("Database connection closed");
        }

        Ok(())
    }

    async fn get_session(&self) -> Result<DatabaseTransaction> {
        let guard = self.conn.read().await;
        let conn = guard.as_ref().ok_or_else(not_connected)?;

        conn.begin().await.map_err(Into::into)
    }
}

fn not_connected() -> AppError {
    AppError::DatabaseConnection {
        message: "database has not been started".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_requires_startup() {
        let db = SeaOrmDatabase::new(DatabaseConfig::default());

        let err = tokio_test::block_on(db.get_session()).unwrap_err();
        assert!(matches!(err, AppError::DatabaseConnection { .. }));

        let err = tokio_test::block_on(db.ping()).unwrap_err();
        assert!(matches!(err, AppError::DatabaseConnection { .. }));
    }

    #[test]
    fn test_shutdown_without_startup_is_safe() {
        let db = SeaOrmDatabase::new(DatabaseConfig::default());
        assert!(tokio_test::block_on(db.shutdown()).is_ok());
    }
}
