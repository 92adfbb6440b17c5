//! Novel Store Port - 持久化端口
//!
//! 定义小说文档的保存、加载与导出接口，具体实现在 infrastructure 层（XML 文件）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{Novel, NovelError};

/// 文档编解码错误
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("XML error: {0}")]
    Xml(String),

    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("Missing attribute: {attribute} on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Invalid novel document: {0}")]
    Invariant(#[from] NovelError),
}

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Codec error in {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

impl StoreError {
    pub fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn codec(path: &Path, source: CodecError) -> Self {
        Self::Codec {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// 已保存小说的列表项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedNovelInfo {
    pub filename: String,
    pub title: String,
    pub genre: String,
    pub chapters: usize,
    pub last_modified: DateTime<Utc>,
}

/// Novel Store Port
#[async_trait]
pub trait NovelStorePort: Send + Sync {
    /// 保存小说到指定路径
    async fn save(&self, novel: &Novel, path: &Path) -> Result<(), StoreError>;

    /// 从指定路径加载小说
    async fn load(&self, path: &Path) -> Result<Novel, StoreError>;

    /// 列出目录中可读取的小说文档（无法解析的文件被跳过）
    async fn list(&self, dir: &Path) -> Result<Vec<SavedNovelInfo>, StoreError>;

    /// 导出为可阅读的纯文本
    async fn export_text(&self, novel: &Novel, path: &Path) -> Result<(), StoreError>;
}
