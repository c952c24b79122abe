use crate::db;
use crate::error::StoreResult;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// 持久化的 key/value 字符串存储，只需要 get/set/remove。
/// 通过构造参数注入给传输层，便于单测替换成内存实现。
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// access/refresh token 对，二者同时存在或同时缺失。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// 读取完整的 token 对；只剩一半时视为未登录。
pub fn load_credentials(store: &dyn CredentialStore) -> StoreResult<Option<CredentialPair>> {
    let access_token = store.get(ACCESS_TOKEN_KEY)?;
    let refresh_token = store.get(REFRESH_TOKEN_KEY)?;
    match (access_token, refresh_token) {
        (Some(access_token), Some(refresh_token)) => Ok(Some(CredentialPair {
            access_token,
            refresh_token,
        })),
        _ => Ok(None),
    }
}

pub fn store_credentials(store: &dyn CredentialStore, pair: &CredentialPair) -> StoreResult<()> {
    store.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
    store.set(REFRESH_TOKEN_KEY, &pair.refresh_token)?;
    Ok(())
}

/// 两个 key 都尝试删除，返回遇到的第一个错误。
pub fn clear_credentials(store: &dyn CredentialStore) -> StoreResult<()> {
    let access = store.remove(ACCESS_TOKEN_KEY);
    let refresh = store.remove(REFRESH_TOKEN_KEY);
    access.and(refresh)
}

/// 默认的 SQLite 实现，数据落在 `credentials` 表。
/// 连接在构造时打开一次并常驻；调用是阻塞的，异步代码应放到阻塞线程池执行。
pub struct SqliteCredentialStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let conn = db::open_connection(&path)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// 使用平台数据目录下的默认数据库。
    pub fn open_default() -> StoreResult<Self> {
        Self::new(db::default_database_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        db::get_credential(&conn, key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        db::set_credential(&conn, key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap_or_else(|p| p.into_inner());
        db::delete_credential(&conn, key)
    }
}

/// 进程内存储：不落盘，适合临时会话与测试。
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(access_token: &str, refresh_token: &str) -> Self {
        let store = Self::new();
        {
            let mut entries = store.entries.lock().unwrap_or_else(|p| p.into_inner());
            entries.insert(ACCESS_TOKEN_KEY.to_string(), access_token.to_string());
            entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh_token.to_string());
        }
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.remove(key);
        Ok(())
    }
}
