//! Novel Context - 小说限界上下文
//!
//! 职责:
//! - 小说聚合根及其不变量（章节连续编号、级联删除）
//! - 章节、大纲、生成上下文、时间线

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::{Novel, NovelParts, NovelSummary};
pub use entities::{Chapter, NovelContext, Outline, OutlineArc, TimelineEntry};
pub use errors::NovelError;
pub use value_objects::{ChapterId, NovelId, OutlineId};
