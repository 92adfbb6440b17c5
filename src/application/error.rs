//! 应用层错误定义
//!
//! 管理器操作的统一错误类型，`main` 中转换为 anyhow::Error。
//! 存储与提示词错误在各自端口上返回，不经过此类型。

use thiserror::Error;

use crate::application::ports::OracleError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 文本生成服务不可用
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),
}
