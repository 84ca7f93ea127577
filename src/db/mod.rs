//! Database module providing connection management, migrations, and queries.

pub mod log_work;
pub mod migrations;
pub mod roles;
pub mod tasks;
pub mod tickets;
pub mod users;

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::config::Config;
use crate::error::{AppError, AppResult};

use self::migrations::MigrationRunner;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration.
    pub async fn new(config: &Config) -> AppResult<Self> {
        let url = config.database.connection_url();

        let mut opts = ConnectOptions::new(url);
        opts.max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        info!("Connecting to database at {}", config.database.display_target());

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Ok(Self { conn })
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get access to the underlying connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply all pending migrations. Returns the names applied.
    pub async fn run_migrations(&self) -> AppResult<Vec<String>> {
        let applied = MigrationRunner::new(&self.conn).up().await?;
        Ok(applied)
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> AppResult<()> {
        self.conn
            .execute_raw(Statement::from_string(
                self.conn.get_database_backend(),
                "SELECT 1",
            ))
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))?;
        Ok(())
    }
}
