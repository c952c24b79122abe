use crate::db;
use crate::error::{StoreError, StoreResult};
use std::path::Path;

const CONCURRENCY_KEY: &str = "upload_max_concurrency";
pub const MIN_UPLOAD_CONCURRENCY: usize = 1;
pub const MAX_UPLOAD_CONCURRENCY: usize = 8;
const DEFAULT_UPLOAD_CONCURRENCY: usize = 2;

/// 从设置表读取批量上传的并行数；缺失时返回默认值，错误时透传。
pub fn get_upload_concurrency(db_path: &Path) -> StoreResult<usize> {
    if let Some(value) = db::get_setting(db_path, CONCURRENCY_KEY)? {
        return parse_and_clamp(&value);
    }
    Ok(DEFAULT_UPLOAD_CONCURRENCY)
}

/// 写入并校验并行数，限定在 [MIN, MAX] 区间。
pub fn set_upload_concurrency(db_path: &Path, value: usize) -> StoreResult<usize> {
    if !(MIN_UPLOAD_CONCURRENCY..=MAX_UPLOAD_CONCURRENCY).contains(&value) {
        return Err(StoreError::InvalidSetting {
            key: CONCURRENCY_KEY.to_string(),
            reason: format!(
                "must be between {} and {}",
                MIN_UPLOAD_CONCURRENCY, MAX_UPLOAD_CONCURRENCY
            ),
        });
    }
    db::set_setting(db_path, CONCURRENCY_KEY, &value.to_string())?;
    Ok(value)
}

pub fn default_upload_concurrency() -> usize {
    DEFAULT_UPLOAD_CONCURRENCY
}

fn parse_and_clamp(raw: &str) -> StoreResult<usize> {
    let parsed = raw
        .trim()
        .parse::<usize>()
        .map_err(|e| StoreError::InvalidSetting {
            key: CONCURRENCY_KEY.to_string(),
            reason: e.to_string(),
        })?;
    Ok(parsed.clamp(MIN_UPLOAD_CONCURRENCY, MAX_UPLOAD_CONCURRENCY))
}
