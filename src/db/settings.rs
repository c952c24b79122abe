use rusqlite::{params, OptionalExtension};
use std::path::Path;

use super::{current_timestamp_millis, with_connection};
use crate::error::StoreResult;

pub(crate) const SETTINGS_TABLE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at_millis INTEGER NOT NULL
);";

pub fn get_setting(path: &Path, key: &str) -> StoreResult<Option<String>> {
    with_connection(path, |conn| {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    })
}

pub fn set_setting(path: &Path, key: &str, value: &str) -> StoreResult<()> {
    let updated_at = current_timestamp_millis();
    with_connection(path, |conn| {
        conn.execute(
            "INSERT INTO settings (key, value, updated_at_millis) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at_millis = excluded.updated_at_millis",
            params![key, value, updated_at],
        )?;
        Ok(())
    })
}
