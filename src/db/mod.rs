mod book_repository;
mod models;
mod user_repository;

use crate::errors::Error;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use tracing::info;

pub use book_repository::*;
pub use models::*;
pub use user_repository::*;

/// Schema migrations compiled into the binary
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// How long a connection waits on a locked database before giving up
const BUSY_TIMEOUT_MS: u32 = 5_000;

pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct SqliteOptions {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqliteOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!("PRAGMA busy_timeout = {};", self.busy_timeout_ms))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Shared handle to the connection pool, cloned into every request
#[derive(Clone, Debug)]
pub struct Database {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl Database {
    /// Opens the pool for `database_url` and applies pending migrations
    ///
    /// # Errors
    ///
    /// Returns an Error if the pool cannot be built or a migration fails
    pub fn new(database_url: &str) -> Result<Self, Error> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder()
            .connection_customizer(Box::new(SqliteOptions {
                busy_timeout_ms: BUSY_TIMEOUT_MS,
            }))
            .build(manager)?;

        let database = Database {
            pool: Arc::new(pool),
        };
        database.run_migrations()?;
        Ok(database)
    }

    pub fn get_conn(&self) -> Result<DbConnection, Error> {
        Ok(self.pool.get()?)
    }

    /// Runs `f` with a pooled connection on tokio's blocking thread pool
    ///
    /// Diesel queries and password hashing both block, so handlers funnel
    /// their repository work through here instead of stalling async workers.
    ///
    /// # Errors
    ///
    /// Returns the Error produced by `f`, a pool Error, or `Error::JoinError`
    /// if the blocking task panicked
    pub async fn run_blocking<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, Error> + Send + 'static,
        T: Send + 'static,
    {
        let database = self.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = database.get_conn()?;
            f(&mut conn)
        })
        .await?
    }

    fn run_migrations(&self) -> Result<(), Error> {
        let mut pooled = self.get_conn()?;
        let conn: &mut SqliteConnection = &mut pooled;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| Error::MigrationError(e.to_string()))?;

        if !applied.is_empty() {
            info!("Applied {} pending migration(s)", applied.len());
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_database() -> Database {
    let path = std::env::temp_dir().join(format!("bookshelf-{}.db", uuid::Uuid::new_v4()));
    Database::new(&path.to_string_lossy()).expect("failed to open test database")
}
