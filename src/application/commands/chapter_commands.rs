//! Chapter Commands

use crate::domain::{Chapter, CharacterId, EventId};

/// 章节部分更新
#[derive(Debug, Clone, Default)]
pub struct ChapterUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub events: Option<Vec<EventId>>,
    pub character_focus: Option<Vec<CharacterId>>,
    pub notes: Option<String>,
}

impl ChapterUpdate {
    /// 应用更新；任何更新都会把章节标记为用户编辑
    pub fn apply_to(self, chapter: &mut Chapter) {
        if let Some(title) = self.title {
            chapter.title = title;
        }
        if let Some(content) = self.content {
            chapter.content = content;
        }
        if let Some(summary) = self.summary {
            chapter.summary = summary;
        }
        if let Some(events) = self.events {
            chapter.events = events;
        }
        if let Some(focus) = self.character_focus {
            chapter.character_focus = focus;
        }
        if let Some(notes) = self.notes {
            chapter.notes = notes;
        }
        chapter.user_edited = true;
    }
}
