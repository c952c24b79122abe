use super::{encode_path_component, StorageClient};
use crate::api::auth::ApiRequest;
use crate::api::client::ensure_success;
use crate::error::{ApiError, ApiResult};
use serde::Deserialize;
use url::Url;

impl StorageClient {
    /// 获取文件的访问地址。
    /// - 响应体是带 `url` 字段的 JSON 时使用该地址（签名 URL）；
    /// - 否则发生过重定向时使用最终 URL；
    /// - 两者都不满足返回 [`ApiError::InvalidResponse`]，不会把 `get_file` 本身当作访问地址。
    pub async fn file_access_url(&self, uuid: &str, preview: bool) -> ApiResult<Url> {
        let url = self.transport.config().storage_url(&format!(
            "get_file/{}?preview={preview}",
            encode_path_component(uuid)
        ));
        let requested = Url::parse(&url).ok();
        let response = self.transport.send(&ApiRequest::get(url)).await?;
        let response = ensure_success(response).await?;

        let final_url = response.url().clone();
        let redirected = requested.as_ref() != Some(&final_url);
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        if is_json {
            let body = response.bytes().await?;
            if let Ok(payload) = serde_json::from_slice::<FileUrlResponse>(&body) {
                return Url::parse(&payload.url)
                    .map_err(|e| ApiError::InvalidResponse(format!("invalid file url: {e}")));
            }
        }

        if redirected {
            Ok(final_url)
        } else {
            Err(ApiError::InvalidResponse(
                "file access response had neither a url nor a redirect".to_string(),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileUrlResponse {
    url: String,
}
