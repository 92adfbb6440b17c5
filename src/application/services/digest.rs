//! 提示词摘要片段
//!
//! 把小说状态压缩成提示词中使用的文本行。

use crate::domain::{Character, Event, Novel, Outline};

/// 无章节时用于计算情节弧区间的规划章节数
const PLANNING_HORIZON: usize = 10;

const FOCUS_TRAITS: usize = 3;
const FOCUS_RELATIONS: usize = 3;

/// 全部角色的简要信息，每行一个
pub fn characters_info(novel: &Novel) -> String {
    novel
        .characters()
        .values()
        .map(Character::brief_info)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 焦点角色一行：年龄、性别、前三个特质与前三条有效关系
pub fn focus_character_line(novel: &Novel, character: &Character) -> String {
    let traits = character
        .traits
        .iter()
        .take(FOCUS_TRAITS)
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let relations = character
        .relationships
        .values()
        .filter_map(|rel| {
            novel.character(rel.target_id()).map(|target| {
                format!(
                    "{}({}, 强度:{:.1})",
                    target.name,
                    rel.relationship_type(),
                    rel.strength()
                )
            })
        })
        .take(FOCUS_RELATIONS)
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "{}: {}岁, {}, 特质: {}, 关系: {}",
        character.name, character.age, character.gender, traits, relations
    )
}

/// 事件列表，每行 `名称: 描述`
pub fn events_info<'a>(events: impl IntoIterator<Item = &'a Event>) -> String {
    events
        .into_iter()
        .map(Event::brief_info)
        .collect::<Vec<_>>()
        .join("\n")
}

/// 第 chapter_number 章对应的情节弧下标
///
/// 区间长度为 ceil(章节数 / 弧数)，至少为 1；无章节时以规划章节数代替。
pub fn arc_index(outline: &Outline, chapter_number: u32, existing_chapters: usize) -> Option<usize> {
    let arc_count = outline.arcs.len();
    if arc_count == 0 {
        return None;
    }
    let horizon = if existing_chapters == 0 {
        PLANNING_HORIZON
    } else {
        existing_chapters
    };
    let span = horizon.div_ceil(arc_count).max(1);
    let index = (chapter_number.saturating_sub(1) as usize) / span;
    Some(index.min(arc_count - 1))
}

/// 章节提示词中的大纲片段：对应弧的描述与关键事件
pub fn outline_for_chapter(novel: &Novel, chapter_number: u32) -> String {
    let Some(outline) = novel.outline() else {
        return String::new();
    };
    let Some(index) = arc_index(outline, chapter_number, novel.chapters().len()) else {
        return String::new();
    };
    let arc = &outline.arcs[index];
    format!("{}\n关键事件: {}", arc.description, arc.key_events.join(", "))
}

/// 上一章摘要（不存在时为空）
pub fn previous_summary(novel: &Novel, chapter_number: u32) -> String {
    chapter_number
        .checked_sub(1)
        .and_then(|previous| novel.chapter(previous))
        .map(|chapter| chapter.summary.clone())
        .unwrap_or_default()
}

/// 新角色提示词中的背景说明
pub fn background_info(novel: &Novel) -> String {
    format!(
        "这个角色生活在{}世界中，这是一部{}类型的小说。",
        novel.setting(),
        novel.genre()
    )
}
