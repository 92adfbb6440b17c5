//! 应用服务
//!
//! - `event_engine`: 章节事件选择与事件效果应用
//! - `focus_policy`: 章节焦点角色选择策略
//! - `digest`: 提示词中使用的小说摘要片段

pub mod digest;
mod event_engine;
mod focus_policy;

pub use event_engine::{EventEngine, DEFAULT_MAX_EVENTS, EVENT_RELATION_TYPE};
pub use focus_policy::{FocusSelectionPolicy, RandomFocusPolicy};
