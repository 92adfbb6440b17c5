//! 领域管理器
//!
//! 每类实体一个管理器。管理器持有 Oracle 等能力，但不持有小说状态：
//! 所有操作都作用于调用方传入的 `&mut Novel`。
//!
//! 生成类操作先调用 Oracle 再修改小说，Oracle 失败时小说保持不变。
//! 响应解析失败不会向外传播，而是注册并返回占位实体。

mod chapter_manager;
mod character_manager;
mod context_manager;
mod event_manager;
mod outline_manager;

pub use chapter_manager::ChapterManager;
pub use character_manager::CharacterManager;
pub use context_manager::ContextManager;
pub use event_manager::EventManager;
pub use outline_manager::OutlineManager;

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{OraclePort, RandomPort};
use crate::application::prompts::PromptTemplates;
use crate::application::services::{EventEngine, RandomFocusPolicy, DEFAULT_MAX_EVENTS};
use crate::domain::Novel;

/// 生成参数
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    /// 角色/事件/大纲请求的输出上限
    pub max_tokens: u32,
    /// 章节请求的输出上限
    pub chapter_max_tokens: u32,
    /// 批量生成事件的默认数量
    pub num_events: usize,
    /// 每章选取的事件上限
    pub max_events_per_chapter: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
            chapter_max_tokens: 4000,
            num_events: 5,
            max_events_per_chapter: DEFAULT_MAX_EVENTS,
        }
    }
}

/// 新小说的初始生成步骤
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPlan {
    pub characters: usize,
    /// 为 0 时跳过事件生成
    pub events: usize,
    pub outline: bool,
}

/// 初始生成结果
///
/// 某一步失败不会中断后续步骤，错误收集在 `failures` 中。
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub characters: usize,
    pub events: usize,
    pub outline_arcs: Option<usize>,
    pub failures: Vec<ApplicationError>,
}

/// 一组共享同一 Oracle 与随机源的管理器
pub struct ManagerSet {
    pub characters: CharacterManager,
    pub events: EventManager,
    pub outline: OutlineManager,
    pub chapters: ChapterManager,
    pub context: ContextManager,
}

impl ManagerSet {
    pub fn new(
        oracle: Arc<dyn OraclePort>,
        random: Arc<dyn RandomPort>,
        templates: Arc<PromptTemplates>,
        settings: GenerationSettings,
    ) -> Self {
        let engine = Arc::new(EventEngine::new(random.clone()));
        let focus_policy = Arc::new(RandomFocusPolicy::new(random));

        Self {
            characters: CharacterManager::new(oracle.clone(), templates.clone(), settings.clone()),
            events: EventManager::new(
                oracle.clone(),
                engine.clone(),
                templates.clone(),
                settings.clone(),
            ),
            outline: OutlineManager::new(oracle.clone(), templates.clone(), settings.clone()),
            chapters: ChapterManager::new(oracle, engine, focus_policy, templates, settings),
            context: ContextManager::new(),
        }
    }
}

impl ManagerSet {
    /// 依次生成角色、事件与大纲；单步失败记录日志后继续
    pub async fn bootstrap_novel(&self, novel: &mut Novel, plan: &BootstrapPlan) -> BootstrapReport {
        let mut report = BootstrapReport {
            characters: self
                .characters
                .generate_characters(novel, plan.characters)
                .await
                .len(),
            ..Default::default()
        };

        if plan.events > 0 {
            match self.events.generate_events(novel, plan.events).await {
                Ok(events) => report.events = events.len(),
                Err(e) => {
                    tracing::error!(novel_id = %novel.id(), error = %e, "Event generation failed");
                    report.failures.push(e);
                }
            }
        }

        if plan.outline {
            match self.outline.generate_outline(novel).await {
                Ok(outline) => report.outline_arcs = Some(outline.arcs.len()),
                Err(e) => {
                    tracing::error!(novel_id = %novel.id(), error = %e, "Outline generation failed");
                    report.failures.push(e);
                }
            }
        }

        report
    }
}
