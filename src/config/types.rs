//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::GenerationSettings;
use crate::infrastructure::adapters::{HttpOracleClientConfig, RetryConfig, DEFAULT_SYSTEM_PROMPT};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Oracle（LLM 服务）配置
    #[serde(default)]
    pub oracle: OracleConfig,

    /// 生成参数
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 提示词模板配置
    #[serde(default)]
    pub prompts: PromptsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// Oracle 配置
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// OpenAI 兼容服务的基础 URL
    #[serde(default = "default_oracle_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,

    /// 最大尝试次数（含首次）
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 重试间隔（毫秒）
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_oracle_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_oracle_timeout() -> u64 {
    120
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2000
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_oracle_url(),
            api_key: String::new(),
            model: default_model(),
            timeout_secs: default_oracle_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl OracleConfig {
    /// HTTP 客户端配置
    pub fn client_config(&self) -> HttpOracleClientConfig {
        HttpOracleClientConfig::new(self.base_url.as_str())
            .with_api_key(self.api_key.as_str())
            .with_model(self.model.as_str())
            .with_timeout(self.timeout_secs)
            .with_system_prompt(self.system_prompt.as_str())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            retry_delay_ms: self.retry_delay_ms,
        }
    }

    /// 用于日志输出的脱敏 API Key
    pub fn masked_api_key(&self) -> String {
        if self.api_key.is_empty() {
            return "<unset>".to_string();
        }
        let visible: String = self.api_key.chars().take(4).collect();
        format!("{}****", visible)
    }
}

/// 生成参数配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_chapter_max_tokens")]
    pub chapter_max_tokens: u32,

    #[serde(default = "default_num_events")]
    pub num_events: usize,

    #[serde(default = "default_max_events_per_chapter")]
    pub max_events_per_chapter: usize,

    /// 随机种子；未设置时使用系统熵
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_chapter_max_tokens() -> u32 {
    4000
}

fn default_num_events() -> usize {
    5
}

fn default_max_events_per_chapter() -> usize {
    3
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            chapter_max_tokens: default_chapter_max_tokens(),
            num_events: default_num_events(),
            max_events_per_chapter: default_max_events_per_chapter(),
            seed: None,
        }
    }
}

impl GenerationConfig {
    pub fn settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            chapter_max_tokens: self.chapter_max_tokens,
            num_events: self.num_events,
            max_events_per_chapter: self.max_events_per_chapter,
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 小说 XML 存档目录
    #[serde(default = "default_saves_dir")]
    pub saves_dir: PathBuf,

    /// 纯文本导出目录
    #[serde(default = "default_exports_dir")]
    pub exports_dir: PathBuf,
}

fn default_saves_dir() -> PathBuf {
    PathBuf::from("saves")
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from("exports")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            saves_dir: default_saves_dir(),
            exports_dir: default_exports_dir(),
        }
    }
}

/// 提示词模板配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptsConfig {
    /// TOML 模板覆盖文件；未设置时使用内置模板
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
