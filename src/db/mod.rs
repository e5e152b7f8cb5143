//! Database connection and schema management

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::info;

use crate::types::{LyceumError, Result};

pub mod entities;
pub mod migration;

pub use migration::Migrator;

/// Connect to the database and verify the connection
pub async fn connect(url: &str) -> Result<DatabaseConnection> {
    info!("Connecting to database");

    let mut opts = ConnectOptions::new(url.to_owned());
    opts.connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let conn = Database::connect(opts)
        .await
        .map_err(|e| LyceumError::Database(format!("Failed to connect to database: {}", e)))?;

    conn.ping()
        .await
        .map_err(|e| LyceumError::Database(format!("Database ping failed: {}", e)))?;

    Ok(conn)
}

/// Apply pending migrations
pub async fn migrate(conn: &DatabaseConnection) -> Result<()> {
    Migrator::up(conn, None)
        .await
        .map_err(|e| LyceumError::Database(format!("Migration failed: {}", e)))?;
    info!("Database schema up to date");
    Ok(())
}
