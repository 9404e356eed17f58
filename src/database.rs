use crate::errors::{DatabaseError, Result};
use crate::migrations::apply_migrations;
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Connection provider shared by every device operation.
///
/// Clones share one connection. After [`Database::close`] every caller gets
/// [`DatabaseError::Connection`].
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Option<Connection>>>,
    path: PathBuf,
}

impl Database {
    /// Open the database at the default location
    pub async fn new() -> Result<Self> {
        let path = crate::get_database_path();
        let db = Self::open_at_path(path).await?;
        Ok(db)
    }

    /// Create a database instance at a specific path
    pub async fn open_at_path(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        log::info!("Opening database at: {:?}", path);

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| {
            log::error!("Failed to open database at {:?}: {}", path, e);
            DatabaseError::Connection(e.to_string())
        })?;

        if let Err(e) = apply_migrations(&conn) {
            log::error!("Failed to apply migrations: {}", e);
            return Err(e);
        }

        log::info!("Database initialized successfully");
        Ok(Self::from_connection(conn, path))
    }

    /// Create an in-memory database instance for testing
    pub async fn new_in_memory() -> Result<Self> {
        log::info!("Creating in-memory database");

        let conn = Connection::open_in_memory().map_err(|e| {
            log::error!("Failed to open in-memory database: {}", e);
            DatabaseError::Connection(e.to_string())
        })?;

        if let Err(e) = apply_migrations(&conn) {
            log::error!("Failed to apply migrations to in-memory database: {}", e);
            return Err(e);
        }

        Ok(Self::from_connection(conn, PathBuf::from(":memory:")))
    }

    fn from_connection(conn: Connection, path: PathBuf) -> Self {
        Database {
            connection: Arc::new(Mutex::new(Some(conn))),
            path,
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Health check - ensure database is accessible
    pub async fn health_check(&self) -> Result<()> {
        self.with_connection_for("health_check", |conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|e| {
                    log::error!("Health check failed: {}", e);
                    DatabaseError::query("health_check", e)
                })
        })
        .await
    }

    /// Execute a closure with the live connection, or fail if it was closed
    pub async fn with_connection<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send,
        R: Send,
    {
        self.with_connection_for("with_connection", f).await
    }

    /// Like [`Database::with_connection`], naming `operation` when no connection is available
    pub async fn with_connection_for<F, R>(&self, operation: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send,
        R: Send,
    {
        let guard = self.connection.lock().await;
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(connection_closed(operation)),
        }
    }

    /// Execute a closure inside a transaction, committing on success
    pub async fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send,
        R: Send,
    {
        let mut guard = self.connection.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| connection_closed("transaction"))?;
        let tx = conn.transaction().map_err(transaction_failed)?;

        let result = f(&tx)?;
        tx.commit().map_err(transaction_failed)?;
        Ok(result)
    }

    /// Drop the underlying connection. Subsequent calls fail with a connection error.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.take() {
            if let Err((_, e)) = conn.close() {
                log::warn!("Error while closing database at {:?}: {}", self.path, e);
                return Err(DatabaseError::Sqlite(e));
            }
            log::info!("Closed database at {:?}", self.path);
        }
        Ok(())
    }

    pub async fn is_open(&self) -> bool {
        self.connection.lock().await.is_some()
    }
}

fn connection_closed(operation: &'static str) -> DatabaseError {
    log::error!("[DB] Failed to connect to database for '{}': connection is closed", operation);
    DatabaseError::Connection(format!("connection is closed ('{}')", operation))
}

fn transaction_failed(e: rusqlite::Error) -> DatabaseError {
    log::error!("[DB] Failed to execute query 'transaction': {}", e);
    DatabaseError::query("transaction", e)
}
