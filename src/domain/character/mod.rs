//! Character Context - 角色限界上下文
//!
//! 职责:
//! - 角色实体与性格属性
//! - 特质（挂载时一次性影响性格）
//! - 有向关系及其历史

mod entities;
mod value_objects;

pub use entities::{Character, HistoryEntry, Relationship, Trait, MAX_STRENGTH, MIN_STRENGTH};
pub use value_objects::{CharacterId, TraitId};
