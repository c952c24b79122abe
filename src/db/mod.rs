mod credentials;
mod settings;

pub use credentials::{delete_credential, get_credential, set_credential};
pub use settings::{get_setting, set_setting};

use crate::error::{StoreError, StoreResult};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "CloudVault";
const APPLICATION: &str = "CloudVault";
const DB_FILE_NAME: &str = "cloudvault.db";

static DEFAULT_DATABASE_PATH: Lazy<Option<PathBuf>> = Lazy::new(|| {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
});

/// 默认数据库位置：平台数据目录下的 `cloudvault.db`。
pub fn default_database_path() -> StoreResult<PathBuf> {
    DEFAULT_DATABASE_PATH
        .clone()
        .ok_or(StoreError::DataDirUnavailable)
}

/// 打开（必要时创建）数据库并执行建表，确认路径可用。
pub fn init_storage(path: &Path) -> StoreResult<()> {
    with_connection(path, |_| Ok(()))
}

pub(crate) fn with_connection<T, F>(path: &Path, operation: F) -> StoreResult<T>
where
    F: FnOnce(&Connection) -> StoreResult<T>,
{
    let conn = open_connection(path)?;
    operation(&conn)
}

/// 打开数据库并执行建表。长期持有连接的调用方（凭据存储）直接使用它。
pub(crate) fn open_connection(path: &Path) -> StoreResult<Connection> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    let conn = Connection::open(path)?;
    apply_migrations(&conn)?;
    Ok(conn)
}

fn apply_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(credentials::CREDENTIALS_TABLE_SCHEMA)?;
    conn.execute_batch(settings::SETTINGS_TABLE_SCHEMA)?;
    Ok(())
}

pub(crate) fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or(0)
}
