//! Postgres connection management and migrations, plus MongoDB behind the
//! `mongodb` feature.

mod config;
mod db;
mod error;
mod mongo;

pub use config::PostgresConfig;
pub use mongo::MongoConfig;
#[cfg(feature = "mongodb")]
pub use mongo::MongoDatabase;
pub use db::Database;
pub use error::{DatabaseError, DatabaseResult};
pub use sea_orm_migration::{MigrationStatus, MigratorTrait};
