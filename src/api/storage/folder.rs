use super::{
    models::{FolderCreation, UploadPayload, UploadTarget},
    UploadOrchestrator,
};
use crate::error::UploadError;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// 拼接父目录与目录名；父目录为空时即为根目录下的目录。
pub fn join_folder_path(parent_path: &str, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{parent_path}/{name}")
    }
}

impl UploadOrchestrator {
    /// 通过上传零字节占位文件创建虚拟目录。
    ///
    /// 目录是否存在以目录记录为准：占位文件传输失败只记录日志，仍然尝试确认；
    /// 确认失败时探测目标路径，能列出则视为目录已存在。
    /// 会话失效在任何阶段都直接返回。
    pub async fn create_folder(
        &self,
        name: &str,
        parent_path: &str,
    ) -> Result<FolderCreation, UploadError> {
        let target_path = join_folder_path(parent_path, name);
        let span = info_span!("create_folder", upload_id = %Uuid::new_v4(), path = %target_path);

        async move {
            let target = UploadTarget::new(UploadPayload::placeholder(), target_path.as_str());
            let ticket = self.request_ticket(&target).await?;

            if let Err(err) = self.transfer(&ticket, &target.file).await {
                if err.is_session_invalid() {
                    return Err(err);
                }
                warn!(file_id = %ticket.file_id, error = %err, "placeholder transfer failed, confirming anyway");
            }

            match self.confirm(&ticket.file_id).await {
                Ok(confirmation) => {
                    info!(file_id = %ticket.file_id, "folder created");
                    Ok(FolderCreation {
                        message: confirmation.message,
                        created: true,
                        storage_usage: Some(confirmation.storage_usage),
                    })
                }
                Err(err) if err.is_session_invalid() => Err(err),
                Err(err) => {
                    if self.check_path_exists(&target_path).await {
                        info!(error = %err, "confirm failed but folder is listable");
                        Ok(FolderCreation::already_exists())
                    } else {
                        Err(err)
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}
