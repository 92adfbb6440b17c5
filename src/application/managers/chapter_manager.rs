//! Chapter Manager - 章节管理
//!
//! 章节生成流程：确定编号 → 选择焦点角色与事件 → 组装提示词 → 调用 Oracle →
//! 解析 → 追加章节并写入时间线。

use std::sync::Arc;

use super::GenerationSettings;
use crate::application::commands::ChapterUpdate;
use crate::application::error::ApplicationError;
use crate::application::parsing::{parse_chapter, ChapterDraft};
use crate::application::ports::{OraclePort, OracleRequest};
use crate::application::prompts::PromptTemplates;
use crate::application::services::{digest, EventEngine, FocusSelectionPolicy};
use crate::domain::{Chapter, CharacterId, EventId, Novel};

/// 评分选择为空时，随机抽取的事件数上限
const FALLBACK_EVENTS: usize = 3;

pub struct ChapterManager {
    oracle: Arc<dyn OraclePort>,
    engine: Arc<EventEngine>,
    focus_policy: Arc<dyn FocusSelectionPolicy>,
    templates: Arc<PromptTemplates>,
    settings: GenerationSettings,
}

impl ChapterManager {
    pub fn new(
        oracle: Arc<dyn OraclePort>,
        engine: Arc<EventEngine>,
        focus_policy: Arc<dyn FocusSelectionPolicy>,
        templates: Arc<PromptTemplates>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            oracle,
            engine,
            focus_policy,
            templates,
            settings,
        }
    }

    /// 手动创建空章节（标记为用户编辑，时间线记录不含摘要）
    pub fn create_chapter<'a>(&self, novel: &'a mut Novel, title: impl Into<String>) -> &'a Chapter {
        let mut chapter = Chapter::create(novel.next_chapter_number(), title);
        chapter.user_edited = true;
        let chapter = novel.push_chapter(chapter);
        tracing::info!(chapter = chapter.number(), title = %chapter.title, "Chapter created");
        chapter
    }

    /// 生成下一章
    pub async fn generate_chapter<'a>(
        &self,
        novel: &'a mut Novel,
    ) -> Result<&'a Chapter, ApplicationError> {
        let number = novel.next_chapter_number();
        let focus = self.focus_policy.select_focus(novel);
        let events = self.select_events(novel);

        let draft = self.request_draft(novel, number, &focus, &events).await?;

        let mut chapter = Chapter::create(number, draft.title);
        chapter.content = draft.content;
        chapter.summary = draft.summary;
        chapter.events = events;
        chapter.character_focus = focus;

        let chapter = novel.push_chapter(chapter);
        tracing::info!(
            chapter = chapter.number(),
            title = %chapter.title,
            focus = chapter.character_focus.len(),
            events = chapter.events.len(),
            "Chapter generated"
        );
        Ok(chapter)
    }

    /// 重新生成第 n 章，保留其焦点角色与事件；章节不存在时返回 None
    pub async fn regenerate_chapter<'a>(
        &self,
        novel: &'a mut Novel,
        number: u32,
    ) -> Result<Option<&'a Chapter>, ApplicationError> {
        let Some(existing) = novel.chapter(number) else {
            return Ok(None);
        };
        let focus = existing.character_focus.clone();
        let events = existing.events.clone();

        let draft = self.request_draft(novel, number, &focus, &events).await?;

        let Some(chapter) = novel.chapter_mut(number) else {
            return Ok(None);
        };
        chapter.title = draft.title;
        chapter.content = draft.content;
        chapter.summary = draft.summary;
        chapter.user_edited = false;

        novel.sync_timeline(number);
        novel.touch();
        tracing::info!(chapter = number, "Chapter regenerated");
        Ok(novel.chapter(number))
    }

    /// 评分选择事件，结果为空但事件库非空时随机抽取
    fn select_events(&self, novel: &Novel) -> Vec<EventId> {
        let mut selected = self
            .engine
            .select_events_for_chapter(novel, self.settings.max_events_per_chapter);
        if selected.is_empty() && !novel.events_library().is_empty() {
            tracing::debug!("No scored events, falling back to random sample");
            selected = self.engine.sample_events(novel, FALLBACK_EVENTS);
        }
        selected.into_iter().map(|event| event.id.clone()).collect()
    }

    async fn request_draft(
        &self,
        novel: &Novel,
        number: u32,
        focus: &[CharacterId],
        events: &[EventId],
    ) -> Result<ChapterDraft, ApplicationError> {
        let prompt = self.chapter_prompt(novel, number, focus, events);
        let response = self
            .oracle
            .generate(OracleRequest::new(
                prompt,
                self.settings.temperature,
                self.settings.chapter_max_tokens,
            ))
            .await?;

        Ok(parse_chapter(&response).unwrap_or_else(|e| {
            tracing::warn!(chapter = number, error = %e, "Chapter response unparseable, using placeholder");
            ChapterDraft::placeholder(number)
        }))
    }

    fn chapter_prompt(
        &self,
        novel: &Novel,
        number: u32,
        focus: &[CharacterId],
        events: &[EventId],
    ) -> String {
        let chapter_number = number.to_string();
        let outline = digest::outline_for_chapter(novel, number);
        let previous_summary = digest::previous_summary(novel, number);
        let character_info = focus
            .iter()
            .filter_map(|id| novel.character(id))
            .map(|character| digest::focus_character_line(novel, character))
            .collect::<Vec<_>>()
            .join("\n");
        let event_info = digest::events_info(events.iter().filter_map(|id| novel.event(id)));
        let context = novel.context().get_context_for_chapter(number);

        PromptTemplates::render(
            &self.templates.chapter,
            &[
                ("chapter_number", chapter_number.as_str()),
                ("title", novel.title()),
                ("genre", novel.genre()),
                ("setting", novel.setting()),
                ("outline", outline.as_str()),
                ("previous_summary", previous_summary.as_str()),
                ("character_info", character_info.as_str()),
                ("event_info", event_info.as_str()),
                ("context", context.as_str()),
            ],
        )
    }

    /// 更新章节并同步时间线；章节标记为用户编辑
    pub fn update_chapter<'a>(
        &self,
        novel: &'a mut Novel,
        number: u32,
        update: ChapterUpdate,
    ) -> Option<&'a Chapter> {
        update.apply_to(novel.chapter_mut(number)?);
        novel.sync_timeline(number);
        novel.touch();
        tracing::info!(chapter = number, "Chapter updated");
        novel.chapter(number)
    }

    /// 删除章节，后续章节编号与时间线前移
    pub fn delete_chapter(&self, novel: &mut Novel, number: u32) -> bool {
        match novel.remove_chapter(number) {
            Some(removed) => {
                tracing::info!(chapter = number, title = %removed.title, "Chapter deleted");
                true
            }
            None => false,
        }
    }

    pub fn get_all_chapters<'a>(&self, novel: &'a Novel) -> &'a [Chapter] {
        novel.chapters()
    }

    pub fn get_chapter<'a>(&self, novel: &'a Novel, number: u32) -> Option<&'a Chapter> {
        novel.chapter(number)
    }

    /// 按标题、正文与摘要做大小写不敏感的子串搜索
    pub fn search_chapters<'a>(&self, novel: &'a Novel, query: &str) -> Vec<&'a Chapter> {
        let query = query.to_lowercase();
        novel
            .chapters()
            .iter()
            .filter(|chapter| chapter.matches(&query))
            .collect()
    }
}
