use migration::{Migrator, MigratorTrait, SCHEMA};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};

use crate::error::AppResult;

const SQLITE_PRAGMAS: &[&str] = &[
    "PRAGMA journal_mode=WAL",
    "PRAGMA synchronous=NORMAL",
    "PRAGMA foreign_keys=ON",
];

pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(max_connections).sqlx_logging(false);
    if database_url.starts_with("postgres") {
        opts.set_schema_search_path(SCHEMA);
    }

    let db = Database::connect(opts).await?;
    prepare(&db).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Backend-specific session setup that has to happen before migrating.
pub async fn prepare(db: &DatabaseConnection) -> AppResult<()> {
    match db.get_database_backend() {
        DatabaseBackend::Postgres => {
            db.execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE SCHEMA IF NOT EXISTS {SCHEMA}"),
            ))
            .await?;
        }
        DatabaseBackend::Sqlite => {
            for pragma in SQLITE_PRAGMAS {
                db.execute(Statement::from_string(DatabaseBackend::Sqlite, pragma.to_string()))
                    .await?;
            }
        }
        _ => {}
    }
    Ok(())
}
