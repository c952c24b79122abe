use super::{models::StorageUsage, StorageClient};
use crate::api::auth::ApiRequest;
use crate::api::client::{decode_json, ensure_success};
use crate::error::ApiResult;
use serde::Deserialize;

impl StorageClient {
    /// 获取当前用户的存储用量。只读，不修改本地状态。
    pub async fn storage_usage(&self) -> ApiResult<StorageUsage> {
        let url = self.transport.config().storage_url("storage_usage");
        let response = self.transport.send(&ApiRequest::get(url)).await?;
        let response = ensure_success(response).await?;
        let payload: StorageUsageResponse = decode_json(response, "storage usage").await?;
        Ok(payload.storage_usage)
    }
}

#[derive(Debug, Deserialize)]
struct StorageUsageResponse {
    storage_usage: StorageUsage,
}
