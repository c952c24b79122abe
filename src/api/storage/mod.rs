mod delete;
mod download;
mod folder;
mod info;
mod list;
mod models;
mod upload;

pub use folder::join_folder_path;
pub use models::{
    EntryKind, FileItem, FolderCreation, FolderEntry, OperationMessage, StorageUsage,
    UploadConfirmation, UploadPayload, UploadTarget, UploadTicket, FOLDER_PLACEHOLDER_NAME,
};
pub use upload::UploadOrchestrator;

use crate::api::auth::AuthenticatedTransport;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// 与浏览器 `encodeURIComponent` 相同的保留集合：`/` 也会被编码，
/// 整个路径作为单个 URL 段传给后端。
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub(crate) fn encode_path_component(raw: &str) -> String {
    utf8_percent_encode(raw, URI_COMPONENT).to_string()
}

/// 存储目录相关的只读/删除操作，全部经过 [`AuthenticatedTransport`]。
#[derive(Clone)]
pub struct StorageClient {
    transport: AuthenticatedTransport,
}

impl StorageClient {
    pub fn new(transport: AuthenticatedTransport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &AuthenticatedTransport {
        &self.transport
    }
}
