use super::{
    encode_path_component,
    models::{FileItem, FolderEntry},
    StorageClient,
};
use crate::api::auth::ApiRequest;
use crate::api::client::{decode_json, ensure_success};
use crate::error::ApiResult;
use tracing::debug;

impl StorageClient {
    /// 平铺列出当前用户的全部文件。
    pub async fn list_files(&self) -> ApiResult<Vec<FileItem>> {
        let url = self.transport.config().storage_url("list_files");
        let response = self.transport.send(&ApiRequest::get(url)).await?;
        let response = ensure_success(response).await?;
        decode_json(response, "file list").await
    }

    /// 列出指定目录下的直接子项；空串表示根目录。
    pub async fn explore_folder(&self, path: &str) -> ApiResult<Vec<FolderEntry>> {
        let response = self
            .transport
            .send(&ApiRequest::get(self.explore_url(path)))
            .await?;
        let response = ensure_success(response).await?;
        decode_json(response, "folder listing").await
    }

    /// 目录能被列出即视为存在（包括空目录）；任何失败都返回 false，
    /// 不区分“不存在”与“请求失败”。
    pub async fn check_path_exists(&self, path: &str) -> bool {
        match self.transport.send(&ApiRequest::get(self.explore_url(path))).await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(path, status = %response.status(), "path check returned non-success");
                false
            }
            Err(err) => {
                debug!(path, error = %err, "path check failed");
                false
            }
        }
    }

    fn explore_url(&self, path: &str) -> String {
        let encoded = encode_path_component(path);
        self.transport
            .config()
            .storage_url(&format!("explore_folder/{encoded}"))
    }
}
