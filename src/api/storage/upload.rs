use super::{
    encode_path_component,
    models::{UploadConfirmation, UploadPayload, UploadTarget, UploadTicket},
    StorageClient,
};
use crate::api::auth::{ApiRequest, AuthenticatedTransport, MultipartForm};
use crate::api::client::read_failure;
use crate::error::{StageFailure, TransferStrategy, UploadError};
use futures_util::{stream, StreamExt};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

const RESUMABLE_HEADER: &str = "x-goog-resumable";

/// 三段式上传：申请票据 → 传输字节 → 确认入库。
///
/// 每个阶段都是独立的异步步骤，失败时带上阶段、已知的 file_id 与底层原因返回；
/// 阶段之间不做任何重试。
#[derive(Clone)]
pub struct UploadOrchestrator {
    transport: AuthenticatedTransport,
    storage: StorageClient,
}

impl UploadOrchestrator {
    pub fn new(transport: AuthenticatedTransport) -> Self {
        Self {
            storage: StorageClient::new(transport.clone()),
            transport,
        }
    }

    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }

    /// 上传单个文件到 `target.folder_path`。
    pub async fn upload(&self, target: &UploadTarget) -> Result<UploadConfirmation, UploadError> {
        let upload_id = Uuid::new_v4();
        let span = info_span!(
            "upload",
            %upload_id,
            file = %target.file.name,
            size = target.file.size()
        );

        async move {
            let ticket = self.request_ticket(target).await?;
            let strategy = self.transfer(&ticket, &target.file).await?;
            let confirmation = self.confirm(&ticket.file_id).await?;
            info!(file_id = %ticket.file_id, %strategy, "upload confirmed");
            Ok(confirmation)
        }
        .instrument(span)
        .await
    }

    /// 批量上传：最多 `upload_concurrency` 个同时进行，结果按输入顺序返回，
    /// 单个失败不影响其他文件。
    pub async fn upload_all(
        &self,
        targets: Vec<UploadTarget>,
    ) -> Vec<(String, Result<UploadConfirmation, UploadError>)> {
        let limit = self.transport.config().upload_concurrency.max(1);
        debug!(count = targets.len(), limit, "starting batch upload");

        stream::iter(targets)
            .map(|target| async move {
                let result = self.upload(&target).await;
                (target.file.name, result)
            })
            .buffered(limit)
            .collect()
            .await
    }

    pub async fn check_path_exists(&self, path: &str) -> bool {
        self.storage.check_path_exists(path).await
    }

    /// 阶段一：以 multipart 表单申请上传票据。
    pub(crate) async fn request_ticket(
        &self,
        target: &UploadTarget,
    ) -> Result<UploadTicket, UploadError> {
        let file = &target.file;
        let config = self.transport.config();
        let form = MultipartForm::new()
            .text("file_name", file.name.as_str())
            .text("folder_path", target.folder_path.as_str())
            .text("file_size", file.size().to_string())
            .text("content_type", file.content_type_or_default())
            .text("client_origin", config.client_origin.as_str());
        let request = ApiRequest::post(config.storage_url("upload_file")).multipart(form);

        let ticket: UploadTicket = async {
            let response = self.send_checked(&request).await?;
            parse_json::<UploadTicket>(response, "upload ticket").await
        }
        .await
        .map_err(|cause| UploadError::Ticket { cause })?;

        debug!(file_id = %ticket.file_id, "upload ticket issued");
        Ok(ticket)
    }

    /// 阶段二：按大小选择直传或可恢复上传。
    pub(crate) async fn transfer(
        &self,
        ticket: &UploadTicket,
        file: &UploadPayload,
    ) -> Result<TransferStrategy, UploadError> {
        let threshold = self.transport.config().resumable_threshold_bytes;
        let strategy = TransferStrategy::for_size(file.size(), threshold);
        debug!(file_id = %ticket.file_id, %strategy, "transferring bytes");

        let result = match strategy {
            TransferStrategy::Direct => self.put_direct(ticket, file).await,
            TransferStrategy::Resumable => self.put_resumable(ticket, file).await,
        };

        result
            .map(|()| strategy)
            .map_err(|cause| UploadError::Transfer {
                file_id: ticket.file_id.clone(),
                strategy,
                cause,
            })
    }

    /// 阶段三：通知后端写入目录记录。
    pub(crate) async fn confirm(&self, file_id: &str) -> Result<UploadConfirmation, UploadError> {
        let url = self
            .transport
            .config()
            .storage_url(&format!("confirm_upload/{}", encode_path_component(file_id)));
        let request = ApiRequest::get(url);

        async {
            let response = self.send_checked(&request).await?;
            parse_json(response, "upload confirmation").await
        }
        .await
        .map_err(|cause| UploadError::Confirm {
            file_id: file_id.to_string(),
            cause,
        })
    }

    /// 把全部字节 PUT 到票据里的签名地址。
    ///
    /// 请求同样经过 [`AuthenticatedTransport::send`]，bearer token 会随请求发往第三方对象存储。
    /// 对象存储返回 401 时响应体是 XML，解析不出 `token_expired`，会话因此被结束并清空凭据。
    async fn put_direct(
        &self,
        ticket: &UploadTicket,
        file: &UploadPayload,
    ) -> Result<(), StageFailure> {
        let request = ApiRequest::put(ticket.upload_url.as_str())
            .header(CONTENT_TYPE, content_type_header(file))
            .bytes(file.bytes.clone());
        self.send_checked(&request).await?;
        Ok(())
    }

    /// 先 POST 初始化会话拿到 `Location`，再把全部字节 PUT 到该地址。
    async fn put_resumable(
        &self,
        ticket: &UploadTicket,
        file: &UploadPayload,
    ) -> Result<(), StageFailure> {
        let content_type = content_type_header(file);
        let init = ApiRequest::post(ticket.resumable_url.as_str())
            .header(CONTENT_TYPE, content_type.clone())
            .header(
                HeaderName::from_static(RESUMABLE_HEADER),
                HeaderValue::from_static("start"),
            )
            .bytes(bytes::Bytes::new());
        let response = self.send_checked(&init).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .ok_or(StageFailure::MissingSessionLocation)?;
        // 相对地址以 resumable_url 为基准解析。
        let session_url = ticket.resumable_url.join(location).map_err(|e| {
            StageFailure::InvalidResponse(format!("invalid resumable session location: {e}"))
        })?;
        debug!(file_id = %ticket.file_id, "resumable session opened");

        let request = ApiRequest::put(session_url.as_str())
            .header(CONTENT_TYPE, content_type)
            .bytes(file.bytes.clone());
        self.send_checked(&request).await?;
        Ok(())
    }

    async fn send_checked(&self, request: &ApiRequest) -> Result<Response, StageFailure> {
        let response = self.transport.send(request).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let (status, message) = read_failure(response).await;
        warn!(url = %request.url(), %status, %message, "upload stage request rejected");
        Err(StageFailure::Status { status, message })
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, StageFailure> {
    let body = response.bytes().await.map_err(StageFailure::Network)?;
    serde_json::from_slice(&body)
        .map_err(|e| StageFailure::InvalidResponse(format!("failed to parse {what}: {e}")))
}

fn content_type_header(file: &UploadPayload) -> HeaderValue {
    HeaderValue::from_str(file.content_type_or_default())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}
