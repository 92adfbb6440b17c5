//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Novel Context: 小说聚合（章节、大纲、上下文、时间线）
//! - Character Context: 角色、特质与关系
//! - Event Context: 可复用的事件模板

/// 定义带前缀的字符串 ID 值对象
///
/// 生成形如 `char_1a2b3c4d` 的 ID（uuid 的前 8 位十六进制）。
/// 从持久化文档恢复时接受任意字符串。
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(String);

        impl $name {
            pub fn generate() -> Self {
                let uuid = uuid::Uuid::new_v4().simple().to_string();
                Self(format!("{}_{}", $prefix, &uuid[..8]))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

pub mod character;
pub mod event;
pub mod novel;

pub use character::{Character, CharacterId, HistoryEntry, Relationship, Trait, TraitId};
pub use event::{EffectTarget, Event, EventEffect, EventId};
pub use novel::{
    Chapter, ChapterId, Novel, NovelContext, NovelError, NovelId, NovelParts, NovelSummary,
    Outline, OutlineArc, OutlineId, TimelineEntry,
};
