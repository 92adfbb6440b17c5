//! 提示词模板
//!
//! 模板是带具名占位符的普通字符串，可通过 TOML 文件整体或部分覆盖。

mod defaults;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read prompt file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse prompt file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// 四类生成请求的提示词模板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub character: String,
    pub events: String,
    pub chapter: String,
    pub outline: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            character: defaults::CHARACTER_TEMPLATE.to_string(),
            events: defaults::EVENTS_TEMPLATE.to_string(),
            chapter: defaults::CHAPTER_TEMPLATE.to_string(),
            outline: defaults::OUTLINE_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// 从 TOML 文本加载，缺失的键使用默认模板
    pub fn from_toml_str(content: &str) -> Result<Self, PromptError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, PromptError> {
        let content = std::fs::read_to_string(path).map_err(|e| PromptError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let templates = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded prompt templates");
        Ok(templates)
    }

    /// 单遍替换 `{key}` 占位符
    ///
    /// 未提供的占位符原样保留；替换值中的花括号不会被再次解释。
    pub fn render(template: &str, values: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            output.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let replacement = after.find('}').and_then(|close| {
                let key = &after[..close];
                values
                    .iter()
                    .find(|(name, _)| *name == key)
                    .map(|(_, value)| (*value, close))
            });
            match replacement {
                Some((value, close)) => {
                    output.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    output.push('{');
                    rest = after;
                }
            }
        }
        output.push_str(rest);
        output
    }
}
