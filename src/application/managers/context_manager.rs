//! Context Manager - 生成上下文管理

use crate::domain::Novel;

#[derive(Debug, Default)]
pub struct ContextManager;

impl ContextManager {
    pub fn new() -> Self {
        Self
    }

    pub fn set_global_context(&self, novel: &mut Novel, context: impl Into<String>) {
        novel.context_mut().global_context = context.into();
        novel.touch();
        tracing::info!(novel_id = %novel.id(), "Global context set");
    }

    pub fn get_global_context<'a>(&self, novel: &'a Novel) -> &'a str {
        &novel.context().global_context
    }

    pub fn set_chapter_context(&self, novel: &mut Novel, chapter_number: u32, context: impl Into<String>) {
        novel.context_mut().set_chapter_context(chapter_number, context);
        novel.touch();
        tracing::info!(novel_id = %novel.id(), chapter = chapter_number, "Chapter context set");
    }

    /// 第 n 章的完整上下文（全局 + 章节）
    pub fn get_chapter_context(&self, novel: &Novel, chapter_number: u32) -> String {
        novel.context().get_context_for_chapter(chapter_number)
    }

    /// 清除章节上下文；不存在时返回 false
    pub fn clear_chapter_context(&self, novel: &mut Novel, chapter_number: u32) -> bool {
        if novel.context_mut().chapter_context.remove(&chapter_number).is_none() {
            return false;
        }
        novel.touch();
        tracing::info!(novel_id = %novel.id(), chapter = chapter_number, "Chapter context cleared");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_context_lifecycle() {
        let manager = ContextManager::new();
        let mut novel = Novel::create("风起", "武侠", "江湖");

        manager.set_global_context(&mut novel, "乱世");
        assert_eq!(manager.get_global_context(&novel), "乱世");
        assert_eq!(manager.get_chapter_context(&novel, 3), "乱世");

        manager.set_chapter_context(&mut novel, 3, "雨夜");
        assert_eq!(manager.get_chapter_context(&novel, 3), "乱世\n雨夜");

        assert!(manager.clear_chapter_context(&mut novel, 3));
        assert!(!manager.clear_chapter_context(&mut novel, 3));
        assert_eq!(manager.get_chapter_context(&novel, 3), "乱世");
    }
}
