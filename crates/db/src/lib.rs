//! Database layer for the legacy ledger schema.
//!
//! This crate provides:
//! - Connection pool setup from [`DatabaseConfig`]
//! - Company schema qualification for raw SQL
//! - Repository implementations of the statement engine's data traits

pub mod repositories;
pub mod schema;

pub use repositories::StatementRepository;
pub use schema::CompanySchema;

use balanza_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database pool ready"
    );
    Ok(db)
}
