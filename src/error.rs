//! 统一的错误类型：传输层、上传阶段、普通 API 调用与本地存储各自一套，
//! 方便调用方按阶段给出具体提示，而不是笼统的“失败”。

use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// 上传状态机中的阶段，用于错误上下文与日志。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadStage {
    Requesting,
    Transferring,
    Confirming,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UploadStage::Requesting => "requesting ticket",
            UploadStage::Transferring => "transferring bytes",
            UploadStage::Confirming => "confirming upload",
        };
        f.write_str(label)
    }
}

/// 按文件大小选择的传输方式。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferStrategy {
    /// 单次 PUT 到签名 URL。
    Direct,
    /// 先初始化可恢复会话，再 PUT 到会话地址。
    Resumable,
}

impl TransferStrategy {
    /// 小于阈值走直传，其余走可恢复上传。
    pub fn for_size(size: u64, threshold: u64) -> Self {
        if size < threshold {
            TransferStrategy::Direct
        } else {
            TransferStrategy::Resumable
        }
    }
}

impl fmt::Display for TransferStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferStrategy::Direct => f.write_str("direct"),
            TransferStrategy::Resumable => f.write_str("resumable"),
        }
    }
}

/// `AuthenticatedTransport::send` 的失败信号。
/// 过期 token 在内部刷新重试，不会出现在这里。
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// 会话已失效，凭据已被清空，调用方应引导用户重新登录。
    #[error("session is no longer valid; please sign in again")]
    SessionInvalid,

    /// 续期时读取本地凭据失败；凭据保持原样，会话未被结束。
    #[error("credential store unavailable: {0}")]
    CredentialStore(#[from] StoreError),
}

/// 单个上传阶段失败的具体原因。
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error("server returned HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("network request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("session is no longer valid; please sign in again")]
    SessionInvalid,

    #[error("resumable session response did not include a Location header")]
    MissingSessionLocation,

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("credential store unavailable: {0}")]
    CredentialStore(#[source] StoreError),
}

impl From<TransportError> for StageFailure {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Network(err) => StageFailure::Network(err),
            TransportError::SessionInvalid => StageFailure::SessionInvalid,
            TransportError::CredentialStore(err) => StageFailure::CredentialStore(err),
        }
    }
}

/// 上传失败，附带阶段与（已知时的）file_id，调用方据此判断远端是否需要对账。
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed while requesting ticket: {cause}")]
    Ticket { cause: StageFailure },

    #[error("failed while transferring bytes of file {file_id} ({strategy}): {cause}")]
    Transfer {
        file_id: String,
        strategy: TransferStrategy,
        cause: StageFailure,
    },

    #[error("file {file_id} may be stored but failed while confirming upload: {cause}")]
    Confirm { file_id: String, cause: StageFailure },
}

impl UploadError {
    pub fn stage(&self) -> UploadStage {
        match self {
            UploadError::Ticket { .. } => UploadStage::Requesting,
            UploadError::Transfer { .. } => UploadStage::Transferring,
            UploadError::Confirm { .. } => UploadStage::Confirming,
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        match self {
            UploadError::Ticket { .. } => None,
            UploadError::Transfer { file_id, .. } | UploadError::Confirm { file_id, .. } => {
                Some(file_id)
            }
        }
    }

    pub fn cause(&self) -> &StageFailure {
        match self {
            UploadError::Ticket { cause }
            | UploadError::Transfer { cause, .. }
            | UploadError::Confirm { cause, .. } => cause,
        }
    }

    pub fn is_session_invalid(&self) -> bool {
        matches!(self.cause(), StageFailure::SessionInvalid)
    }

    /// 票据阶段之后的失败可能留下“有字节无目录”或相反的状态。
    pub fn needs_reconciliation(&self) -> bool {
        !matches!(self, UploadError::Ticket { .. })
    }
}

/// 目录、删除、用量、登录等普通调用的错误。
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("session is no longer valid; please sign in again")]
    SessionInvalid,

    #[error("server returned HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TransportError> for ApiError {
    fn from(value: TransportError) -> Self {
        match value {
            TransportError::Network(err) => ApiError::Network(err),
            TransportError::SessionInvalid => ApiError::SessionInvalid,
            TransportError::CredentialStore(err) => ApiError::Store(err),
        }
    }
}

/// 本地持久化（SQLite 凭据与设置）错误。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to resolve application data directory")]
    DataDirUnavailable,

    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("credential store task failed: {0}")]
    TaskFailed(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type ApiResult<T> = Result<T, ApiError>;
