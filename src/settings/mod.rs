pub mod api_base_url;
pub mod upload_concurrency;
pub mod upload_threshold;

pub use api_base_url::{get_api_base_url, set_api_base_url, DEFAULT_API_BASE_URL};
pub use upload_concurrency::{
    default_upload_concurrency, get_upload_concurrency, set_upload_concurrency,
    MAX_UPLOAD_CONCURRENCY, MIN_UPLOAD_CONCURRENCY,
};
pub use upload_threshold::{
    default_resumable_threshold_bytes, get_resumable_threshold_bytes,
    set_resumable_threshold_mib, MAX_RESUMABLE_THRESHOLD_MIB, MIN_RESUMABLE_THRESHOLD_MIB,
};

use crate::error::{ApiError, ApiResult};
use std::path::Path;
use std::time::Duration;

const API_BASE_URL_ENV: &str = "CLOUDVAULT_API_BASE_URL";
const CLIENT_ORIGIN_ENV: &str = "CLOUDVAULT_CLIENT_ORIGIN";
pub const DEFAULT_CLIENT_ORIGIN: &str = "http://localhost:8080";

/// 一次客户端会话的运行配置。
///
/// 优先级：环境变量 > 设置表 > 内置默认值。请求超时默认不设，
/// 长时间传输依赖底层 HTTP 栈自身的行为。
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub client_origin: String,
    pub resumable_threshold_bytes: u64,
    pub request_timeout: Option<Duration>,
    pub upload_concurrency: usize,
}

impl ClientConfig {
    pub fn new(api_base_url: &str) -> ApiResult<Self> {
        let api_base_url = api_base_url::normalize_base_url(api_base_url)
            .map_err(|reason| ApiError::Config(format!("api base url: {reason}")))?;
        Ok(Self {
            api_base_url,
            client_origin: DEFAULT_CLIENT_ORIGIN.to_string(),
            resumable_threshold_bytes: default_resumable_threshold_bytes(),
            request_timeout: None,
            upload_concurrency: default_upload_concurrency(),
        })
    }

    /// 只看环境变量与默认值，不触碰本地数据库。
    pub fn from_env() -> ApiResult<Self> {
        let base = env_value(API_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let mut config = Self::new(&base)?;
        if let Some(origin) = env_value(CLIENT_ORIGIN_ENV) {
            config.client_origin = origin;
        }
        Ok(config)
    }

    pub fn load(db_path: &Path) -> ApiResult<Self> {
        let base = match env_value(API_BASE_URL_ENV) {
            Some(value) => value,
            None => get_api_base_url(db_path)?,
        };
        let mut config = Self::new(&base)?;
        if let Some(origin) = env_value(CLIENT_ORIGIN_ENV) {
            config.client_origin = origin;
        }
        config.resumable_threshold_bytes = get_resumable_threshold_bytes(db_path)?;
        config.upload_concurrency = get_upload_concurrency(db_path)?;
        Ok(config)
    }

    pub fn with_client_origin(mut self, origin: impl Into<String>) -> Self {
        self.client_origin = origin.into();
        self
    }

    pub fn with_resumable_threshold(mut self, bytes: u64) -> Self {
        self.resumable_threshold_bytes = bytes.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_upload_concurrency(mut self, limit: usize) -> Self {
        self.upload_concurrency = limit.clamp(MIN_UPLOAD_CONCURRENCY, MAX_UPLOAD_CONCURRENCY);
        self
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    pub fn auth_url(&self, path: &str) -> String {
        self.api_url(&format!("auth/{}", path.trim_start_matches('/')))
    }

    pub fn storage_url(&self, path: &str) -> String {
        self.api_url(&format!("storage/{}", path.trim_start_matches('/')))
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
