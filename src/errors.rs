use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query '{operation}' failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl DatabaseError {
    /// Wrap a driver error raised while running the named statement.
    pub fn query(operation: &'static str, source: rusqlite::Error) -> Self {
        DatabaseError::Query { operation, source }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection(_))
    }

    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
