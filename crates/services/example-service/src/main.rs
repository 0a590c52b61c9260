//! Example Service - HTTP server for examples.

use clap::Parser;

use example_service::RunOptions;

#[derive(Parser)]
#[command(name = "example-service")]
#[command(about = "Example microservice")]
struct Cli {
    /// Apply the database migrations and exit
    #[arg(long, env = "MIGRATE_ONLY")]
    migrate_only: bool,
    /// Start without applying the database migrations
    #[arg(long, env = "SKIP_MIGRATIONS", conflicts_with = "migrate_only")]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    example_service::run(RunOptions {
        migrate_only: cli.migrate_only,
        skip_migrations: cli.skip_migrations,
    })
    .await
}
