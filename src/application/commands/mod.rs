//! 应用层 - 命令（写操作）
//!
//! 创建参数与部分更新补丁。补丁字段均为 Option，只应用存在的字段。

mod chapter_commands;
mod character_commands;
mod event_commands;
mod outline_commands;

pub use chapter_commands::*;
pub use character_commands::*;
pub use event_commands::*;
pub use outline_commands::*;
