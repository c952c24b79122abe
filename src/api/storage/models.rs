use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use url::Url;

/// 虚拟目录占位文件名。后端目录只是对象路径前缀，上传该空文件即“创建”目录。
pub const FOLDER_PLACEHOLDER_NAME: &str = ".placeholder";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 待上传的内容：文件名、可选的 MIME 类型与完整字节。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPayload {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadPayload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into()).filter(|t: &String| !t.trim().is_empty());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// 未知类型时回退为 `application/octet-stream`。
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// 零字节的目录占位文件。
    pub fn placeholder() -> Self {
        Self::new(FOLDER_PLACEHOLDER_NAME, Bytes::new())
    }

    /// 从本地文件读取内容，文件名取路径最后一段，类型留空。
    pub async fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("path has no usable file name: {}", path.display()),
                )
            })?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(name, bytes))
    }
}

/// 一次上传请求：内容 + 目标目录（斜杠分隔，空串为根目录）。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadTarget {
    pub file: UploadPayload,
    pub folder_path: String,
}

impl UploadTarget {
    pub fn new(file: UploadPayload, folder_path: impl Into<String>) -> Self {
        Self {
            file,
            folder_path: folder_path.into(),
        }
    }
}

/// 后端签发的上传票据，只在一次上传内使用，不落盘。
#[derive(Clone, Debug, Deserialize)]
pub struct UploadTicket {
    pub file_id: String,
    pub upload_url: Url,
    pub resumable_url: Url,
    #[serde(default)]
    pub storage_usage: Option<StorageUsage>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageUsage {
    pub used_mb: f64,
    pub total_mb: f64,
    pub percentage: f64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UploadConfirmation {
    pub message: String,
    pub storage_usage: StorageUsage,
}

/// 创建目录的结果；`created == false` 表示目录原本就存在。
#[derive(Clone, Debug, PartialEq)]
pub struct FolderCreation {
    pub message: String,
    pub created: bool,
    pub storage_usage: Option<StorageUsage>,
}

impl FolderCreation {
    pub(crate) fn already_exists() -> Self {
        Self {
            message: "Folder exists".to_string(),
            created: false,
            storage_usage: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

/// `explore_folder` 返回的目录项。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FolderEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl FolderEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

/// `list_files` 返回的平铺文件记录。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileItem {
    pub uuid: String,
    pub name: String,
    pub folder_path: String,
    pub size: u64,
    pub created_at: String,
}

/// 删除类接口的通用返回。
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OperationMessage {
    #[serde(default)]
    pub message: String,
}
