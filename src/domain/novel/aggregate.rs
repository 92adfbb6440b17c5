//! Novel Context - Aggregate Root

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Chapter, NovelContext, NovelError, NovelId, Outline, TimelineEntry};
use crate::domain::character::{Character, CharacterId};
use crate::domain::event::{Event, EventId};

/// Novel 聚合根
///
/// 不变量:
/// - 章节编号从 1 开始连续，`current_chapter == chapters.len()`
/// - 角色、事件、章节 ID 在各自集合内唯一
/// - 删除角色时级联清理其他角色指向它的关系
/// - 删除事件时级联清理章节中的事件引用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Novel {
    id: NovelId,
    title: String,
    genre: String,
    setting: String,
    characters: IndexMap<CharacterId, Character>,
    chapters: Vec<Chapter>,
    events_library: IndexMap<EventId, Event>,
    timeline: Vec<TimelineEntry>,
    current_chapter: u32,
    outline: Option<Outline>,
    context: NovelContext,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

/// 重建 Novel 所需的全部字段（持久化解码使用）
#[derive(Debug, Clone)]
pub struct NovelParts {
    pub id: NovelId,
    pub title: String,
    pub genre: String,
    pub setting: String,
    pub characters: Vec<Character>,
    pub chapters: Vec<Chapter>,
    pub events: Vec<Event>,
    pub timeline: Vec<TimelineEntry>,
    pub current_chapter: u32,
    pub outline: Option<Outline>,
    pub context: NovelContext,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// 小说概要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NovelSummary {
    pub id: String,
    pub title: String,
    pub genre: String,
    pub setting: String,
    pub current_chapter: u32,
    pub creation_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub character_count: usize,
    pub chapter_count: usize,
    pub event_count: usize,
    pub has_outline: bool,
}

impl Novel {
    /// 创建新小说
    pub fn create(
        title: impl Into<String>,
        genre: impl Into<String>,
        setting: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: NovelId::generate(),
            title: title.into(),
            genre: genre.into(),
            setting: setting.into(),
            characters: IndexMap::new(),
            chapters: Vec::new(),
            events_library: IndexMap::new(),
            timeline: Vec::new(),
            current_chapter: 0,
            outline: None,
            context: NovelContext::default(),
            created_at: now,
            last_modified: now,
        }
    }

    /// 从持久化数据重建
    ///
    /// 章节编号必须为 1..=n；`current_chapter` 与章节数不一致时以章节数为准。
    pub fn from_parts(parts: NovelParts) -> Result<Self, NovelError> {
        let mut characters = IndexMap::with_capacity(parts.characters.len());
        for character in parts.characters {
            if characters.contains_key(&character.id) {
                return Err(NovelError::DuplicateCharacter(character.id));
            }
            characters.insert(character.id.clone(), character);
        }

        let mut events_library = IndexMap::with_capacity(parts.events.len());
        for event in parts.events {
            if events_library.contains_key(&event.id) {
                return Err(NovelError::DuplicateEvent(event.id));
            }
            events_library.insert(event.id.clone(), event);
        }

        let mut chapter_ids = HashSet::new();
        for (index, chapter) in parts.chapters.iter().enumerate() {
            let position = index as u32 + 1;
            if chapter.number() != position {
                return Err(NovelError::NonContiguousChapters {
                    position,
                    found: chapter.number(),
                });
            }
            if !chapter_ids.insert(chapter.id.clone()) {
                return Err(NovelError::DuplicateChapter(chapter.id.clone()));
            }
        }

        let chapter_count = parts.chapters.len() as u32;
        if parts.current_chapter != chapter_count {
            tracing::warn!(
                novel_id = %parts.id,
                stored = parts.current_chapter,
                chapters = chapter_count,
                "current_chapter does not match chapter count, reconciling"
            );
        }

        Ok(Self {
            id: parts.id,
            title: parts.title,
            genre: parts.genre,
            setting: parts.setting,
            characters,
            chapters: parts.chapters,
            events_library,
            timeline: parts.timeline,
            current_chapter: chapter_count,
            outline: parts.outline,
            context: parts.context,
            created_at: parts.created_at,
            last_modified: parts.last_modified,
        })
    }

    /// 更新最后修改时间
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }

    // ------------------------------------------------------------------
    // Characters
    // ------------------------------------------------------------------

    /// 注册角色（同 ID 会覆盖）
    pub fn add_character(&mut self, character: Character) -> &Character {
        self.touch();
        let id = character.id.clone();
        self.characters.insert(id.clone(), character);
        &self.characters[&id]
    }

    /// 删除角色，并清理其他角色指向它的关系
    pub fn remove_character(&mut self, id: &CharacterId) -> Option<Character> {
        let removed = self.characters.shift_remove(id)?;
        for character in self.characters.values_mut() {
            character.relationships.shift_remove(id);
        }
        self.touch();
        Some(removed)
    }

    /// 更新 from 对 to 的单向关系；任一角色不存在或 from == to 时返回 false
    pub fn update_relationship(
        &mut self,
        from: &CharacterId,
        to: &CharacterId,
        relationship_type: &str,
        delta: f64,
        description: &str,
    ) -> bool {
        if from == to || !self.characters.contains_key(to) {
            return false;
        }
        let Some(character) = self.characters.get_mut(from) else {
            return false;
        };
        character.update_relationship(to, relationship_type, delta, description);
        self.touch();
        true
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event(&mut self, event: Event) -> &Event {
        self.touch();
        let id = event.id.clone();
        self.events_library.insert(id.clone(), event);
        &self.events_library[&id]
    }

    /// 删除事件，并从所有章节的事件列表中移除
    pub fn remove_event(&mut self, id: &EventId) -> Option<Event> {
        let removed = self.events_library.shift_remove(id)?;
        for chapter in &mut self.chapters {
            chapter.events.retain(|event_id| event_id != id);
        }
        self.touch();
        Some(removed)
    }

    // ------------------------------------------------------------------
    // Chapters
    // ------------------------------------------------------------------

    /// 下一章的编号
    pub fn next_chapter_number(&self) -> u32 {
        self.current_chapter + 1
    }

    /// 追加章节：分配编号、推进 current_chapter、写入时间线
    pub fn push_chapter(&mut self, mut chapter: Chapter) -> &Chapter {
        let number = self.next_chapter_number();
        chapter.set_number(number);
        self.timeline.push(TimelineEntry::for_chapter(&chapter));
        self.chapters.push(chapter);
        self.current_chapter = number;
        self.touch();
        &self.chapters[self.chapters.len() - 1]
    }

    /// 删除章节并重新编号，同时修剪/平移时间线
    pub fn remove_chapter(&mut self, number: u32) -> Option<Chapter> {
        if number == 0 || number as usize > self.chapters.len() {
            return None;
        }
        let removed = self.chapters.remove(number as usize - 1);
        for (index, chapter) in self.chapters.iter_mut().enumerate() {
            chapter.set_number(index as u32 + 1);
        }
        self.current_chapter = self.chapters.len() as u32;

        self.timeline.retain(|entry| entry.chapter != number);
        for entry in &mut self.timeline {
            if entry.chapter > number {
                entry.chapter -= 1;
            }
        }

        self.touch();
        Some(removed)
    }

    /// 将章节的标题与摘要同步到时间线
    pub fn sync_timeline(&mut self, number: u32) {
        let Some(chapter) = self.chapter(number) else {
            return;
        };
        let title = chapter.title.clone();
        let summary = chapter.summary.clone();
        if let Some(entry) = self.timeline.iter_mut().find(|entry| entry.chapter == number) {
            entry.title = title;
            entry.summary = (!summary.is_empty()).then_some(summary);
        }
    }

    pub fn chapter(&self, number: u32) -> Option<&Chapter> {
        if number == 0 {
            return None;
        }
        self.chapters.get(number as usize - 1)
    }

    pub fn chapter_mut(&mut self, number: u32) -> Option<&mut Chapter> {
        if number == 0 {
            return None;
        }
        self.chapters.get_mut(number as usize - 1)
    }

    // ------------------------------------------------------------------
    // Outline & context
    // ------------------------------------------------------------------

    pub fn set_outline(&mut self, outline: Outline) -> &Outline {
        self.touch();
        self.outline.insert(outline)
    }

    pub fn outline_mut(&mut self) -> Option<&mut Outline> {
        self.outline.as_mut()
    }

    /// 取得大纲，不存在时以给定概述创建
    pub fn outline_or_create(&mut self, overview: &str) -> &mut Outline {
        self.outline.get_or_insert_with(|| Outline::create(overview))
    }

    pub fn context_mut(&mut self) -> &mut NovelContext {
        &mut self.context
    }

    // ------------------------------------------------------------------
    // Getters
    // ------------------------------------------------------------------

    pub fn id(&self) -> &NovelId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn setting(&self) -> &str {
        &self.setting
    }

    pub fn characters(&self) -> &IndexMap<CharacterId, Character> {
        &self.characters
    }

    pub fn character(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn character_mut(&mut self, id: &CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn events_library(&self) -> &IndexMap<EventId, Event> {
        &self.events_library
    }

    pub fn event(&self, id: &EventId) -> Option<&Event> {
        self.events_library.get(id)
    }

    pub fn event_mut(&mut self, id: &EventId) -> Option<&mut Event> {
        self.events_library.get_mut(id)
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    pub fn current_chapter(&self) -> u32 {
        self.current_chapter
    }

    pub fn outline(&self) -> Option<&Outline> {
        self.outline.as_ref()
    }

    pub fn context(&self) -> &NovelContext {
        &self.context
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn summary(&self) -> NovelSummary {
        NovelSummary {
            id: self.id.to_string(),
            title: self.title.clone(),
            genre: self.genre.clone(),
            setting: self.setting.clone(),
            current_chapter: self.current_chapter,
            creation_date: self.created_at,
            last_modified: self.last_modified,
            character_count: self.characters.len(),
            chapter_count: self.chapters.len(),
            event_count: self.events_library.len(),
            has_outline: self.outline.is_some(),
        }
    }
}
