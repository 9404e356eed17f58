use crate::errors::{DatabaseError, Result};
use crate::types::DeviceRecord;
use crate::Database;
use rusqlite::{OptionalExtension, Row};

// SQLite counterpart of UNIX_TIMESTAMP()
macro_rules! now {
    () => {
        "CAST(strftime('%s', 'now') AS INTEGER)"
    };
}

const TOUCH_SQL: &str = concat!(
    "UPDATE device SET last_host = ?1, last_seen = ",
    now!(),
    " WHERE uuid = ?2"
);

const SET_LAST_LOCATION_SQL: &str = concat!(
    "UPDATE device SET last_lat = ?1, last_lon = ?2, last_seen = ",
    now!(),
    ", last_host = ?3 WHERE uuid = ?4"
);

fn query_failed(operation: &'static str, e: rusqlite::Error) -> DatabaseError {
    log::error!("[DEVICE] Failed to execute query '{}': {}", operation, e);
    DatabaseError::query(operation, e)
}

/// NaN and infinities would be stored as NULL by SQLite, so refuse them up front.
fn check_coordinates(operation: &'static str, lat: Option<f64>, lon: Option<f64>) -> Result<()> {
    for (name, value) in [("lat", lat), ("lon", lon)] {
        if let Some(v) = value {
            if !v.is_finite() {
                log::error!("[DEVICE] Rejected '{}': non-finite {} {}", operation, name, v);
                return Err(DatabaseError::InvalidData(format!(
                    "{} must be finite, got {}",
                    name, v
                )));
            }
        }
    }
    Ok(())
}

impl DeviceRecord {
    /// Hydrate from `uuid, instance_name, last_host, last_seen, account_username, last_lat, last_lon`
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get(0)?,
            instance_name: row.get(1)?,
            last_host: row.get(2)?,
            last_seen: row.get(3)?,
            account_username: row.get(4)?,
            last_lat: row.get(5)?,
            last_lon: row.get(6)?,
        })
    }

    /// Record that `uuid` reported in from `host` just now.
    ///
    /// Unknown uuids are ignored.
    pub async fn touch(db: &Database, uuid: &str, host: &str) -> Result<()> {
        db.with_connection_for("touch", |conn| {
            let updated = conn
                .execute(TOUCH_SQL, rusqlite::params![host, uuid])
                .map_err(|e| query_failed("touch", e))?;

            log::debug!("Touched device {} from {} ({} row(s))", uuid, host, updated);
            Ok(())
        })
        .await
    }

    /// Write every field of this record to the row currently keyed by `old_uuid`.
    ///
    /// When `self.uuid` differs from `old_uuid` the row is renamed.
    pub async fn save(&self, db: &Database, old_uuid: &str) -> Result<()> {
        check_coordinates("save", self.last_lat, self.last_lon)?;

        db.with_connection_for("save", |conn| {
            let updated = conn
                .execute(
                    "UPDATE device
                     SET uuid = ?1, instance_name = ?2, last_host = ?3, last_seen = ?4,
                         account_username = ?5, last_lat = ?6, last_lon = ?7
                     WHERE uuid = ?8",
                    rusqlite::params![
                        self.uuid,
                        self.instance_name,
                        self.last_host,
                        self.last_seen,
                        self.account_username,
                        self.last_lat,
                        self.last_lon,
                        old_uuid
                    ],
                )
                .map_err(|e| query_failed("save", e))?;

            if old_uuid != self.uuid {
                log::info!("Renamed device {} to {} ({} row(s))", old_uuid, self.uuid, updated);
            } else {
                log::debug!("Saved device {} ({} row(s))", self.uuid, updated);
            }
            Ok(())
        })
        .await
    }

    /// Insert this record as a new row. Fails if the uuid is already taken.
    pub async fn create(&self, db: &Database) -> Result<()> {
        check_coordinates("create", self.last_lat, self.last_lon)?;

        db.with_connection_for("create", |conn| {
            conn.execute(
                "INSERT INTO device (uuid, instance_name, last_host, last_seen, account_username, last_lat, last_lon)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    self.uuid,
                    self.instance_name,
                    self.last_host,
                    self.last_seen,
                    self.account_username,
                    self.last_lat,
                    self.last_lon
                ],
            )
            .map_err(|e| query_failed("create", e))?;

            log::info!("Created device: {}", self.uuid);
            Ok(())
        })
        .await
    }

    pub async fn get_all(db: &Database) -> Result<Vec<DeviceRecord>> {
        db.with_connection_for("get_all", |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT uuid, instance_name, last_host, last_seen, account_username, last_lat, last_lon
                     FROM device",
                )
                .map_err(|e| query_failed("get_all", e))?;

            let devices = stmt
                .query_map([], Self::from_row)
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(|e| query_failed("get_all", e))?;

            Ok(devices)
        })
        .await
    }

    /// All devices that are members of `group_name`.
    pub async fn get_all_in_group(db: &Database, group_name: &str) -> Result<Vec<DeviceRecord>> {
        db.with_connection_for("get_all_in_group", |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT uuid, instance_name, last_host, last_seen, account_username, last_lat, last_lon
                     FROM device
                     JOIN device_group_device dgd ON uuid = dgd.device_uuid
                     WHERE dgd.device_group_name = ?1",
                )
                .map_err(|e| query_failed("get_all_in_group", e))?;

            let devices = stmt
                .query_map([group_name], Self::from_row)
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
                .map_err(|e| query_failed("get_all_in_group", e))?;

            Ok(devices)
        })
        .await
    }

    pub async fn get_by_id(db: &Database, uuid: &str) -> Result<Option<DeviceRecord>> {
        db.with_connection_for("get_by_id", |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT instance_name, last_host, last_seen, account_username, last_lat, last_lon
                     FROM device
                     WHERE uuid = ?1
                     LIMIT 1",
                )
                .map_err(|e| query_failed("get_by_id", e))?;

            let device = stmt
                .query_row([uuid], |row| {
                    Ok(DeviceRecord {
                        uuid: uuid.to_string(),
                        instance_name: row.get(0)?,
                        last_host: row.get(1)?,
                        last_seen: row.get(2)?,
                        account_username: row.get(3)?,
                        last_lat: row.get(4)?,
                        last_lon: row.get(5)?,
                    })
                })
                .optional()
                .map_err(|e| query_failed("get_by_id", e))?;

            Ok(device)
        })
        .await
    }

    /// Store a new position for `uuid` and mark it as seen from `host`.
    ///
    /// Unknown uuids are ignored.
    pub async fn set_last_location(
        db: &Database,
        uuid: &str,
        lat: f64,
        lon: f64,
        host: &str,
    ) -> Result<()> {
        check_coordinates("set_last_location", Some(lat), Some(lon))?;

        db.with_connection_for("set_last_location", |conn| {
            let updated = conn
                .execute(SET_LAST_LOCATION_SQL, rusqlite::params![lat, lon, host, uuid])
                .map_err(|e| query_failed("set_last_location", e))?;

            log::debug!(
                "Set location of device {} to ({}, {}) ({} row(s))",
                uuid, lat, lon, updated
            );
            Ok(())
        })
        .await
    }
}
