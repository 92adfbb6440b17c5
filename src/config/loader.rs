//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（novelforge.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["novelforge", "novelforge.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `NOVELFORGE_`，层级分隔符 `__`）
/// 2. 配置文件（novelforge.toml 或 novelforge.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `NOVELFORGE_ORACLE__API_KEY=sk-...`
/// - `NOVELFORGE_ORACLE__BASE_URL=http://localhost:11434/v1`
/// - `NOVELFORGE_GENERATION__SEED=42`
/// - `NOVELFORGE_STORAGE__SAVES_DIR=/data/saves`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("oracle.base_url", "https://api.openai.com/v1")?
        .set_default("oracle.model", "gpt-4")?
        .set_default("oracle.timeout_secs", 120)?
        .set_default("oracle.max_attempts", 3)?
        .set_default("oracle.retry_delay_ms", 2000)?
        .set_default("generation.temperature", 0.7)?
        .set_default("generation.max_tokens", 2000)?
        .set_default("generation.chapter_max_tokens", 4000)?
        .set_default("generation.num_events", 5)?
        .set_default("generation.max_events_per_chapter", 3)?
        .set_default("storage.saves_dir", "saves")?
        .set_default("storage.exports_dir", "exports")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: NOVELFORGE_ORACLE__MODEL=gpt-4o
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("NOVELFORGE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.oracle.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Oracle base URL cannot be empty".to_string(),
        ));
    }

    if config.oracle.model.is_empty() {
        return Err(ConfigError::ValidationError(
            "Oracle model cannot be empty".to_string(),
        ));
    }

    if config.oracle.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "Oracle max_attempts must be at least 1".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&config.generation.temperature) {
        return Err(ConfigError::ValidationError(format!(
            "Temperature must be within 0.0..=2.0, got {}",
            config.generation.temperature
        )));
    }

    if config.generation.max_tokens == 0 || config.generation.chapter_max_tokens == 0 {
        return Err(ConfigError::ValidationError(
            "Token limits cannot be 0".to_string(),
        ));
    }

    if config.storage.saves_dir.as_os_str().is_empty()
        || config.storage.exports_dir.as_os_str().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "Storage directories cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Oracle URL: {}", config.oracle.base_url);
    tracing::info!("Oracle Model: {}", config.oracle.model);
    tracing::info!("Oracle API Key: {}", config.oracle.masked_api_key());
    tracing::info!("Oracle Timeout: {}s", config.oracle.timeout_secs);
    tracing::info!(
        "Oracle Retry: {} attempts, {}ms delay",
        config.oracle.max_attempts,
        config.oracle.retry_delay_ms
    );
    tracing::info!("Temperature: {}", config.generation.temperature);
    tracing::info!(
        "Max Tokens: {} (chapter {})",
        config.generation.max_tokens,
        config.generation.chapter_max_tokens
    );
    match config.generation.seed {
        Some(seed) => tracing::info!("Random Seed: {}", seed),
        None => tracing::info!("Random Seed: <entropy>"),
    }
    tracing::info!("Saves Directory: {:?}", config.storage.saves_dir);
    tracing::info!("Exports Directory: {:?}", config.storage.exports_dir);
    if let Some(file) = &config.prompts.file {
        tracing::info!("Prompt Templates: {:?}", file);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
