use crate::db;
use crate::error::{StoreError, StoreResult};
use std::path::Path;

const THRESHOLD_KEY: &str = "resumable_threshold_mib";
pub const MIN_RESUMABLE_THRESHOLD_MIB: u64 = 1;
pub const MAX_RESUMABLE_THRESHOLD_MIB: u64 = 1024;
const DEFAULT_RESUMABLE_THRESHOLD_MIB: u64 = 10;
const MIB: u64 = 1024 * 1024;

/// 直传与可恢复上传的分界（字节）。读取失败时透传错误。
pub fn get_resumable_threshold_bytes(db_path: &Path) -> StoreResult<u64> {
    let mib = match db::get_setting(db_path, THRESHOLD_KEY)? {
        Some(value) => parse_and_clamp(&value)?,
        None => DEFAULT_RESUMABLE_THRESHOLD_MIB,
    };
    Ok(mib * MIB)
}

/// 以 MiB 为单位写入分界值。
pub fn set_resumable_threshold_mib(db_path: &Path, mib: u64) -> StoreResult<u64> {
    if !(MIN_RESUMABLE_THRESHOLD_MIB..=MAX_RESUMABLE_THRESHOLD_MIB).contains(&mib) {
        return Err(StoreError::InvalidSetting {
            key: THRESHOLD_KEY.to_string(),
            reason: format!(
                "must be between {} and {} MiB",
                MIN_RESUMABLE_THRESHOLD_MIB, MAX_RESUMABLE_THRESHOLD_MIB
            ),
        });
    }
    db::set_setting(db_path, THRESHOLD_KEY, &mib.to_string())?;
    Ok(mib)
}

pub fn default_resumable_threshold_bytes() -> u64 {
    DEFAULT_RESUMABLE_THRESHOLD_MIB * MIB
}

fn parse_and_clamp(raw: &str) -> StoreResult<u64> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| StoreError::InvalidSetting {
            key: THRESHOLD_KEY.to_string(),
            reason: e.to_string(),
        })?;
    Ok(parsed.clamp(MIN_RESUMABLE_THRESHOLD_MIB, MAX_RESUMABLE_THRESHOLD_MIB))
}
