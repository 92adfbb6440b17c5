//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Oracle、RandomPort、NovelStore）
//! - parsing: Oracle 响应与 XML 文档的结构化解析
//! - prompts: 提示词模板
//! - commands: 创建参数与部分更新补丁
//! - services: 事件引擎、焦点选择策略、提示词摘要
//! - managers: 各实体族的管理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod managers;
pub mod parsing;
pub mod ports;
pub mod prompts;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use commands::{
    ChapterUpdate, CharacterUpdate, CreateCharacter, CreateEvent, EventUpdate, OutlineUpdate,
    RelationshipDirection, UpdateRelationship,
};

pub use error::ApplicationError;

pub use managers::{
    BootstrapPlan, BootstrapReport, ChapterManager, CharacterManager, ContextManager,
    EventManager, GenerationSettings, ManagerSet, OutlineManager,
};

pub use parsing::{ChapterDraft, ResponseParseError};

pub use ports::{
    CodecError, NovelStorePort, OracleError, OraclePort, OracleRequest, RandomPort,
    SavedNovelInfo, StoreError,
};

pub use prompts::{PromptError, PromptTemplates};

pub use services::{EventEngine, FocusSelectionPolicy, RandomFocusPolicy};
