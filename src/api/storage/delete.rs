use super::{encode_path_component, models::OperationMessage, StorageClient};
use crate::api::auth::ApiRequest;
use crate::api::client::ensure_success;
use crate::error::ApiResult;
use reqwest::Response;
use tracing::info;

impl StorageClient {
    /// 删除单个文件（对象与目录记录一并删除）。
    pub async fn delete_file(&self, uuid: &str) -> ApiResult<OperationMessage> {
        let url = self
            .transport
            .config()
            .storage_url(&format!("delete_file/{}", encode_path_component(uuid)));
        let response = self.transport.send(&ApiRequest::delete(url)).await?;
        let message = read_operation_message(ensure_success(response).await?).await?;
        info!(uuid, "file deleted");
        Ok(message)
    }

    /// 递归删除目录及其下全部文件。
    pub async fn delete_folder(&self, path: &str) -> ApiResult<OperationMessage> {
        let url = self
            .transport
            .config()
            .storage_url(&format!("delete_folder/{}", encode_path_component(path)));
        let response = self.transport.send(&ApiRequest::delete(url)).await?;
        let message = read_operation_message(ensure_success(response).await?).await?;
        info!(path, "folder deleted");
        Ok(message)
    }
}

/// 删除接口有时返回空 body 或非 JSON，此时给出空消息而不是报错。
async fn read_operation_message(response: Response) -> ApiResult<OperationMessage> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body).unwrap_or_default())
}
