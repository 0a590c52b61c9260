//! Example Service Library
//!
//! Stores examples in Postgres and asks a remote service to check them.
//! The HTTP stack (logging, tracing, security, ACL) comes from the `server`
//! crate; this crate only adds its routes, storage and client.

pub mod config;
pub mod handlers;
pub mod migrations;
pub mod model;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

use database::Database;
use httphandler::HttpHandler;
use server::Server;
use tracing::info;

use crate::config::ExampleConfig;
use crate::migrations::Migrator;
use crate::routes::create_router;
use crate::state::AppState;

/// How the service binary should start.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Apply the migrations and exit
    pub migrate_only: bool,
    /// Connect without applying the migrations
    pub skip_migrations: bool,
}

/// Load the configuration, then serve until SIGINT or SIGTERM.
pub async fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let (config, env_files) = common::load::<ExampleConfig>()?;
    let server = Server::new(config.server.clone(), &env_files).await?;

    if options.migrate_only {
        let db = Database::connect_without_migrations(&config.postgres).await?;
        db.run_migrations::<Migrator>().await?;
        info!("Migrations applied successfully");
        db.close().await;
        return Ok(());
    }

    let db = if options.skip_migrations {
        Database::connect_without_migrations(&config.postgres).await?
    } else {
        Database::connect::<Migrator>(&config.postgres).await?
    };

    let client = HttpHandler::new(config.client.clone())?;
    let state = AppState::from_parts(db.get_connection(), client);
    let router = server.router(create_router(state));

    let served = server.serve(router).await;
    db.close().await;
    served?;

    Ok(())
}
