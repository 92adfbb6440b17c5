//! Novel Context - Errors

use thiserror::Error;

use crate::domain::character::CharacterId;
use crate::domain::event::EventId;

use super::ChapterId;

/// 从持久化数据重建 Novel 时违反的不变量
#[derive(Debug, Error)]
pub enum NovelError {
    #[error("角色 ID 重复: {0}")]
    DuplicateCharacter(CharacterId),

    #[error("事件 ID 重复: {0}")]
    DuplicateEvent(EventId),

    #[error("章节 ID 重复: {0}")]
    DuplicateChapter(ChapterId),

    #[error("章节编号不连续: 第 {position} 个章节的编号为 {found}")]
    NonContiguousChapters { position: u32, found: u32 },
}
