use crate::errors::{DatabaseError, Result};
use rusqlite::Connection;

/// Initialize the database schema
pub fn apply_migrations(conn: &Connection) -> Result<()> {
    // Rename through `save` relies on ON UPDATE CASCADE
    conn.pragma_update(None, "foreign_keys", "ON")?;

    log::info!("Creating database schema...");

    conn.execute_batch(FULL_SCHEMA)
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    log::info!("Database schema created successfully");
    Ok(())
}

const FULL_SCHEMA: &str = r#"
-- Scanning devices, keyed by the uuid the device reports
CREATE TABLE IF NOT EXISTS device (
    uuid             TEXT PRIMARY KEY NOT NULL,
    instance_name    TEXT,
    last_host        TEXT,               -- IP or hostname of the last report
    last_seen        INTEGER NOT NULL DEFAULT 0, -- epoch seconds
    account_username TEXT,
    last_lat         REAL,
    last_lon         REAL
);

CREATE TABLE IF NOT EXISTS device_group (
    name TEXT PRIMARY KEY NOT NULL
);

CREATE TABLE IF NOT EXISTS device_group_device (
    device_group_name TEXT NOT NULL
        REFERENCES device_group(name) ON DELETE CASCADE ON UPDATE CASCADE,
    device_uuid       TEXT NOT NULL
        REFERENCES device(uuid) ON DELETE CASCADE ON UPDATE CASCADE,
    PRIMARY KEY (device_group_name, device_uuid)
);

CREATE INDEX IF NOT EXISTS idx_device_group_device_uuid ON device_group_device(device_uuid);
CREATE INDEX IF NOT EXISTS idx_device_instance_name ON device(instance_name);
"#;
