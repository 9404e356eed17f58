pub mod database;
pub mod device;
pub mod migrations;
pub mod types;
pub mod errors;

// Re-export main types and the database
pub use database::Database;
pub use types::*;
pub use errors::{DatabaseError, Result};

use std::path::PathBuf;

/// Environment variable that overrides the default database location
pub const DATABASE_PATH_ENV: &str = "DEVICEMAP_DB_PATH";

/// Initialize the database and return a Database instance
pub async fn init_database() -> anyhow::Result<Database> {
    Database::new().await.map_err(Into::into)
}

/// Get the default database path
pub fn get_database_path() -> PathBuf {
    if let Some(path) = std::env::var_os(DATABASE_PATH_ENV) {
        return PathBuf::from(path);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".devicemap")
        .join("devicemap.db")
}

/// Check if the database file exists
pub fn database_exists() -> bool {
    get_database_path().exists()
}
