//! CloudVault 客户端核心：带自动续期的鉴权传输层、三段式上传、虚拟目录与
//! 存储目录操作。凭据与设置保存在本地 SQLite。

pub mod api;
mod db;
pub mod error;
pub mod logging;
pub mod settings;

pub use api::auth::{
    AuthSession, AuthenticatedTransport, CredentialStore, MemoryCredentialStore,
    SqliteCredentialStore,
};
pub use api::storage::{StorageClient, UploadOrchestrator, UploadPayload, UploadTarget};
pub use db::{default_database_path, init_storage};
pub use error::{ApiError, StageFailure, StoreError, TransportError, UploadError, UploadStage};
pub use settings::ClientConfig;
