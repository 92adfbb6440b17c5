//! Oracle Port - 文本生成能力抽象
//!
//! 定义 LLM 文本生成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

/// Oracle 错误
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// 重试耗尽后的终止错误
    #[error("Oracle unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },
}

impl OracleError {
    /// 是否值得重试
    pub fn is_retryable(&self) -> bool {
        match self {
            OracleError::NetworkError(_) | OracleError::Timeout => true,
            OracleError::InvalidResponse(_) => true,
            OracleError::ServiceError(msg) => {
                !msg.contains("400") && !msg.contains("401") && !msg.contains("403")
            }
            OracleError::Unavailable { .. } => false,
        }
    }
}

/// 生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl OracleRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }
}

/// Oracle Port
///
/// 外部 LLM 服务的抽象接口，返回原始文本（可能是格式错误的）
#[async_trait]
pub trait OraclePort: Send + Sync {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError>;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
