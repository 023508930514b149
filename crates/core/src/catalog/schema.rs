use rusqlite::Connection;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: u32 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS photos (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            filename         TEXT NOT NULL UNIQUE,
            path             TEXT NOT NULL,
            capture_time     TEXT,
            gps_lat          REAL,
            gps_lon          REAL,
            proj_x           REAL,
            proj_y           REAL,
            orig_x           REAL,
            orig_y           REAL,
            category         TEXT NOT NULL DEFAULT 'unknown',
            matched_point_id TEXT,
            distance         REAL,
            assigned_name    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_photos_point ON photos(matched_point_id);

        CREATE TABLE IF NOT EXISTS config (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Stamp a fresh database with the current version and refuse databases
/// written by a newer build.
pub fn migrate(conn: &Connection) -> Result<()> {
    let stored: Option<String> = conn
        .query_row("SELECT value FROM config WHERE key = 'schema_version'", [], |r| r.get(0))
        .ok();

    match stored.and_then(|v| v.parse::<u32>().ok()) {
        Some(db) if db > SCHEMA_VERSION => Err(Error::SchemaTooNew { db, code: SCHEMA_VERSION }),
        Some(_) => Ok(()),
        None => {
            conn.execute(
                "INSERT INTO config (key, value) VALUES ('schema_version', ?1)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                [SCHEMA_VERSION.to_string()],
            )?;
            Ok(())
        }
    }
}
