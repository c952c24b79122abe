use crate::db;
use crate::error::{StoreError, StoreResult};
use std::path::Path;
use url::Url;

const API_BASE_URL_KEY: &str = "api_base_url";
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

pub fn get_api_base_url(db_path: &Path) -> StoreResult<String> {
    if let Some(value) = db::get_setting(db_path, API_BASE_URL_KEY)? {
        return Ok(value);
    }
    Ok(DEFAULT_API_BASE_URL.to_string())
}

/// 写入前先校验为 http/https 地址，并去掉末尾的 `/`。
pub fn set_api_base_url(db_path: &Path, value: &str) -> StoreResult<String> {
    let normalized = normalize_base_url(value).map_err(|reason| StoreError::InvalidSetting {
        key: API_BASE_URL_KEY.to_string(),
        reason,
    })?;
    db::set_setting(db_path, API_BASE_URL_KEY, &normalized)?;
    Ok(normalized)
}

pub(crate) fn normalize_base_url(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("base url cannot be empty".to_string());
    }
    let parsed = Url::parse(trimmed).map_err(|e| format!("invalid url: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", parsed.scheme()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}
