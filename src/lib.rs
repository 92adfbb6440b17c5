//! NovelForge - LLM 驱动的小说生成引擎
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Novel Context: 小说聚合（章节、大纲、上下文、时间线）
//! - Character Context: 角色、特质与关系
//! - Event Context: 事件模板与效果
//!
//! 应用层 (application/):
//! - Ports: 端口定义（OraclePort, RandomPort, NovelStorePort）
//! - Commands: 创建与部分更新命令
//! - Parsing: Oracle 结构化响应解析
//! - Services: 事件选择/效果引擎、焦点角色策略
//! - Managers: 角色、事件、大纲、章节、上下文管理器
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP Oracle 客户端、重试包装、脚本化 Oracle、随机源
//! - Persistence: XML 文档编解码与文件存储

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
