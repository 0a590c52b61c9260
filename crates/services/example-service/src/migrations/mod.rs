//! Database migrations of the example tables.
//!
//! Names follow `m{YYYYMMDD}_{NNNNNN}_{description}`. State is kept in
//! `seaql_migrations_example` so other services can share the database.

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_examples_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20240101_000001_create_examples_table::Migration)]
    }

    fn migration_table_name() -> DynIden {
        Alias::new("seaql_migrations_example").into_iden()
    }
}
