//! Novel Context - Entities

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ChapterId, OutlineId};
use crate::domain::character::CharacterId;
use crate::domain::event::EventId;

/// 章节
///
/// 不变量:
/// - number 从 1 开始，在 Novel 内连续
/// - events / character_focus 只保存 ID（弱引用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    number: u32,
    pub title: String,
    pub events: Vec<EventId>,
    pub character_focus: Vec<CharacterId>,
    pub content: String,
    pub summary: String,
    pub user_edited: bool,
    pub notes: String,
}

impl Chapter {
    pub fn create(number: u32, title: impl Into<String>) -> Self {
        Self::with_id(ChapterId::generate(), number, title)
    }

    pub fn with_id(id: ChapterId, number: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            number,
            title: title.into(),
            events: Vec::new(),
            character_focus: Vec::new(),
            content: String::new(),
            summary: String::new(),
            user_edited: false,
            notes: String::new(),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// 章节编号由 Novel 聚合维护
    pub(crate) fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    /// 大小写不敏感匹配标题、正文与摘要（query 需已小写）
    pub fn matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(query)
            || self.content.to_lowercase().contains(query)
            || self.summary.to_lowercase().contains(query)
    }
}

/// 大纲中的情节弧
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineArc {
    pub name: String,
    pub description: String,
    /// 关键事件的文字描述（不是事件 ID）
    pub key_events: Vec<String>,
}

impl OutlineArc {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            key_events: Vec::new(),
        }
    }
}

/// 小说大纲
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub id: OutlineId,
    pub overview: String,
    pub arcs: Vec<OutlineArc>,
}

impl Outline {
    pub fn create(overview: impl Into<String>) -> Self {
        Self {
            id: OutlineId::generate(),
            overview: overview.into(),
            arcs: Vec::new(),
        }
    }

    /// 解析失败时使用的占位大纲
    pub fn placeholder() -> Self {
        Self::create("生成失败的大纲")
    }
}

/// 生成上下文
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovelContext {
    /// 附加到每次生成提示词的全局上下文
    pub global_context: String,
    /// 章节编号 -> 章节特定上下文（稀疏）
    pub chapter_context: BTreeMap<u32, String>,
}

impl NovelContext {
    /// 全局上下文 + 章节上下文（若存在，以换行分隔）
    pub fn get_context_for_chapter(&self, chapter_number: u32) -> String {
        let mut context = self.global_context.clone();
        if let Some(chapter_context) = self.chapter_context.get(&chapter_number) {
            context.push('\n');
            context.push_str(chapter_context);
        }
        context
    }

    pub fn set_chapter_context(&mut self, chapter_number: u32, context: impl Into<String>) {
        self.chapter_context.insert(chapter_number, context.into());
    }
}

/// 时间线记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub chapter: u32,
    pub title: String,
    pub summary: Option<String>,
}

impl TimelineEntry {
    pub fn for_chapter(chapter: &Chapter) -> Self {
        Self {
            chapter: chapter.number(),
            title: chapter.title.clone(),
            summary: (!chapter.summary.is_empty()).then(|| chapter.summary.clone()),
        }
    }
}
