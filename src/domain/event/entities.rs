//! Event Context - Entities

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::EventId;

const CHARACTER_RELATION: &str = "character_relation";

/// 效果作用目标
///
/// 目前只有 `character_relation` 会被事件引擎解释，其余目标原样保留。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectTarget {
    CharacterRelation,
    Other(String),
}

impl EffectTarget {
    pub fn as_str(&self) -> &str {
        match self {
            EffectTarget::CharacterRelation => CHARACTER_RELATION,
            EffectTarget::Other(target) => target,
        }
    }
}

impl From<&str> for EffectTarget {
    fn from(target: &str) -> Self {
        if target == CHARACTER_RELATION {
            EffectTarget::CharacterRelation
        } else {
            EffectTarget::Other(target.to_string())
        }
    }
}

impl std::fmt::Display for EffectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 事件效果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEffect {
    pub target: EffectTarget,
    pub value: f64,
}

impl EventEffect {
    pub fn character_relation(value: f64) -> Self {
        Self {
            target: EffectTarget::CharacterRelation,
            value,
        }
    }
}

/// 可复用的事件模板
///
/// 事件独立存放在事件库中，章节通过 ID 引用（多对多）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    /// 触发条件（类型 -> 值），对引擎不透明
    pub triggers: IndexMap<String, String>,
    pub effects: Vec<EventEffect>,
    pub narrative_templates: Vec<String>,
    pub user_editable: bool,
    pub notes: String,
}

impl Event {
    pub fn create(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_id(EventId::generate(), name, description)
    }

    pub fn with_id(id: EventId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            triggers: IndexMap::new(),
            effects: Vec::new(),
            narrative_templates: Vec::new(),
            user_editable: true,
            notes: String::new(),
        }
    }

    /// 解析失败时使用的占位事件
    pub fn placeholder() -> Self {
        Self::create("默认事件", "因解析错误生成的事件")
    }

    /// 用于章节提示词的一行摘要
    pub fn brief_info(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }

    /// 大小写不敏感匹配名称与描述（query 需已小写）
    pub fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self.description.to_lowercase().contains(query)
    }
}
