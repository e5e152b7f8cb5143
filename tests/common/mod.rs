//! Shared test setup: in-memory SQLite with the full schema applied

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use lyceum::db::Migrator;

/// Fresh in-memory database. One pooled connection so every query sees
/// the same SQLite instance.
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_owned());
    opts.max_connections(1).sqlx_logging(false);

    let conn = Database::connect(opts)
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&conn, None).await.expect("apply migrations");
    conn
}
