//! Postgres module

use anyhow::Result;
use clap::Parser;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

mod dns_records;
mod email_messages;

/// Database connection
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    /// The database connection pool
    pub pool: PgPool,
}

impl PostgresDatabase {
    /// Create a new database connection
    #[mutants::skip]
    pub async fn new(details: &DatabaseConnectionDetails) -> Result<Self> {
        Ok(Self {
            pool: PgPoolOptions::new()
                .max_connections(details.max_connections)
                .connect(&details.connection_string)
                .await?,
        })
    }

    /// Returns the underlying database connection
    pub fn connection(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations
    #[mutants::skip]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;

        info!("database migrations applied");

        Ok(())
    }
}

/// Database connection details
#[derive(Debug, Parser)]
pub struct DatabaseConnectionDetails {
    /// The database connection string
    #[arg(long, env = "DATABASE_URL")]
    pub connection_string: String,

    /// Pool size
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value = "5")]
    pub max_connections: u32,
}
