//! Resilient Oracle - 有界重试包装
//!
//! 包装任意 OraclePort 实现：固定间隔重试，耗尽后返回 `OracleError::Unavailable`。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{OracleError, OraclePort, OracleRequest};

/// 重试配置
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 总尝试次数（含首次），至少为 1
    pub max_attempts: u32,
    /// 两次尝试之间的固定等待（毫秒）
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 2000,
        }
    }
}

/// 带重试的 Oracle
pub struct ResilientOracle {
    inner: Arc<dyn OraclePort>,
    config: RetryConfig,
}

impl ResilientOracle {
    pub fn new(inner: Arc<dyn OraclePort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl OraclePort for ResilientOracle {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match self.inner.generate(request.clone()).await {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::info!(attempt = attempt, "Oracle request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(e) => e,
            };

            if attempt >= max_attempts || !error.is_retryable() {
                tracing::error!(
                    attempts = attempt,
                    error = %error,
                    retryable = error.is_retryable(),
                    "Oracle request failed, giving up"
                );
                return Err(OracleError::Unavailable {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }

            tracing::warn!(
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = self.config.retry_delay_ms,
                error = %error,
                "Oracle request failed, retrying..."
            );
            tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
        }
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}
