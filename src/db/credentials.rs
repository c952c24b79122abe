use rusqlite::{params, Connection, OptionalExtension};

use super::current_timestamp_millis;
use crate::error::StoreResult;

/// 凭据持久化：以 key/value 形式保存 access_token 与 refresh_token，
/// 便于客户端跨多次启动复用登录状态。
pub(crate) const CREDENTIALS_TABLE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS credentials (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at_millis INTEGER NOT NULL
);";

/// 凭据读写复用调用方持有的连接，避免每次读取都重新打开数据库。
pub fn get_credential(conn: &Connection, key: &str) -> StoreResult<Option<String>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM credentials WHERE key = ?",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_credential(conn: &Connection, key: &str, value: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO credentials (key, value, updated_at_millis) VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at_millis = excluded.updated_at_millis",
        params![key, value, current_timestamp_millis()],
    )?;
    Ok(())
}

pub fn delete_credential(conn: &Connection, key: &str) -> StoreResult<()> {
    conn.execute("DELETE FROM credentials WHERE key = ?", params![key])?;
    Ok(())
}
