//! Scripted Oracle - 按队列返回预设回复
//!
//! 不访问网络，用于测试与离线运行。每次调用弹出一条回复，并记录收到的请求。

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::application::ports::{OracleError, OraclePort, OracleRequest};

/// Scripted Oracle
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    requests: Mutex<Vec<OracleRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用一组文本回复初始化
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let oracle = Self::new();
        for reply in replies {
            oracle.push_reply(reply);
        }
        oracle
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.replies).push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: OracleError) {
        lock(&self.replies).push_back(Err(error));
    }

    /// 已收到的请求（按调用顺序）
    pub fn requests(&self) -> Vec<OracleRequest> {
        lock(&self.requests).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

#[async_trait]
impl OraclePort for ScriptedOracle {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError> {
        tracing::debug!(
            prompt_len = request.prompt.len(),
            max_tokens = request.max_tokens,
            "ScriptedOracle: returning next reply"
        );
        lock(&self.requests).push(request);
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::ServiceError("no scripted reply left".to_string())))
    }
}
