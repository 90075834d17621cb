pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_content_tables;
mod m20240101_000002_add_association_unique;

/// PostgreSQL schema namespace holding every catalog table.
pub const SCHEMA: &str = "content";

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_content_tables::Migration),
            Box::new(m20240101_000002_add_association_unique::Migration),
        ]
    }
}
