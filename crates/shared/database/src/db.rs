//! Database connection and initialization.

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, Statement};
use sea_orm_migration::{MigrationStatus, MigratorTrait};
use tracing::Level;

use crate::{
    config::PostgresConfig,
    error::{DatabaseError, DatabaseResult},
};

/// Database wrapper for connection management
#[derive(Clone)]
pub struct Database {
    connection: DatabaseConnection,
    timeout: Duration,
}

impl Database {
    /// Open the pool, ping the server and apply the pending migrations of `M`.
    pub async fn connect<M: MigratorTrait>(config: &PostgresConfig) -> DatabaseResult<Self> {
        let db = Self::connect_without_migrations(config).await?;
        db.run_migrations::<M>().await?;
        Ok(db)
    }

    /// Open the pool and ping the server (for CLI commands and tests).
    pub async fn connect_without_migrations(config: &PostgresConfig) -> DatabaseResult<Self> {
        let connection = SeaDatabase::connect(connect_options(config))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "error while initializing Postgres connection");
                e
            })?;

        let db = Self::from_connection(connection, config.timeout);
        db.ping().await.map_err(|e| {
            tracing::error!(error = %e, "error while pinging the Postgres connection");
            e
        })?;

        tracing::info!("Connection to Postgres server was started.");
        Ok(db)
    }

    /// Wrap an already opened connection; `timeout` bounds [`Database::ping`].
    pub fn from_connection(connection: DatabaseConnection, timeout: Duration) -> Self {
        Self {
            connection,
            timeout,
        }
    }

    /// Get a reference to the database connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Get a clone of the database connection.
    pub fn get_connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Run pending migrations.
    pub async fn run_migrations<M: MigratorTrait>(&self) -> DatabaseResult<()> {
        let table = M::migration_table_name().to_string();
        tracing::info!(table = %table, "Migrating postgres database");

        M::up(&self.connection, None).await.map_err(|e| {
            tracing::error!(table = %table, error = %e, "error while migrating Postgres");
            DatabaseError::from(e)
        })
    }

    /// Rollback the last migration.
    pub async fn rollback_migration<M: MigratorTrait>(&self) -> DatabaseResult<()> {
        M::down(&self.connection, Some(1)).await?;
        Ok(())
    }

    /// Get migration status (list all migrations with applied status).
    pub async fn migration_status<M: MigratorTrait>(&self) -> DatabaseResult<Vec<(String, bool)>> {
        let migrations = M::get_migration_with_status(&self.connection).await?;

        Ok(migrations
            .iter()
            .map(|m| (m.name().to_string(), m.status() == MigrationStatus::Applied))
            .collect())
    }

    /// Drop every table and run all migrations fresh.
    pub async fn fresh_migrations<M: MigratorTrait>(&self) -> DatabaseResult<()> {
        M::fresh(&self.connection).await?;
        Ok(())
    }

    /// Check database connectivity within the configured timeout.
    pub async fn ping(&self) -> DatabaseResult<()> {
        let query = self.connection.execute(Statement::from_string(
            self.connection.get_database_backend(),
            "SELECT 1".to_string(),
        ));

        tokio::time::timeout(self.timeout, query)
            .await
            .map_err(|_| DatabaseError::PingTimeout(self.timeout))??;
        Ok(())
    }

    /// Close the pool.
    pub async fn close(self) {
        if let Err(e) = self.connection.close().await {
            tracing::error!(error = %e, "error while disconnecting from Postgres server");
        }
        tracing::info!("Connection to Postgres server was closed.");
    }
}

fn connect_options(config: &PostgresConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new(config.url());
    options
        .max_connections(config.max_open_connections)
        .max_lifetime(config.conn_max_lifetime)
        .connect_timeout(config.timeout)
        .acquire_timeout(config.timeout)
        .sqlx_logging(tracing::enabled!(Level::DEBUG));
    options
}
