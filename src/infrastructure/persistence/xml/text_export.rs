//! 纯文本手稿导出

use crate::domain::Novel;

const EXPORT_BACKGROUND_CHARS: usize = 100;

/// 渲染可阅读的纯文本：标题、类型、背景、角色列表与全部章节正文
pub fn render_manuscript(novel: &Novel) -> String {
    let mut out = format!(
        "《{}》\n\n类型: {}\n背景: {}\n\n主要角色:\n",
        novel.title(),
        novel.genre(),
        novel.setting()
    );

    for character in novel.characters().values() {
        let background: String = character
            .background
            .chars()
            .take(EXPORT_BACKGROUND_CHARS)
            .collect();
        out.push_str(&format!(
            "- {}: {}岁, {}\n  背景: {}...\n\n",
            character.name, character.age, character.gender, background
        ));
    }

    out.push_str("\n--- 正文 ---\n\n");
    for chapter in novel.chapters() {
        out.push_str(&format!(
            "\n第{}章: {}\n\n{}\n\n",
            chapter.number(),
            chapter.title,
            chapter.content
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Chapter, Character};

    #[test]
    fn test_manuscript_layout() {
        let mut novel = Novel::create("剑影", "武侠", "江湖");
        novel.add_character(Character::create("林风", 24, "男", "铁匠之子"));
        let mut chapter = Chapter::create(1, "风起");
        chapter.content = "正文内容".to_string();
        novel.push_chapter(chapter);

        let text = render_manuscript(&novel);
        assert!(text.starts_with("《剑影》\n\n类型: 武侠\n背景: 江湖\n\n主要角色:\n"));
        assert!(text.contains("- 林风: 24岁, 男\n  背景: 铁匠之子...\n"));
        assert!(text.contains("--- 正文 ---"));
        assert!(text.contains("\n第1章: 风起\n\n正文内容\n"));
    }

    #[test]
    fn test_manuscript_exact_text() {
        let mut novel = Novel::create("t", "g", "s");
        novel.add_character(Character::create("甲", 30, "女", "短"));
        let mut chapter = Chapter::create(1, "一");
        chapter.content = "文".to_string();
        novel.push_chapter(chapter);

        assert_eq!(
            render_manuscript(&novel),
            "《t》\n\n类型: g\n背景: s\n\n主要角色:\n\
             - 甲: 30岁, 女\n  背景: 短...\n\n\
             \n--- 正文 ---\n\n\
             \n第1章: 一\n\n文\n\n"
        );
    }

    #[test]
    fn test_background_truncated_by_chars() {
        let mut novel = Novel::create("t", "g", "s");
        novel.add_character(Character::create("长", 1, "男", "字".repeat(150)));
        let text = render_manuscript(&novel);
        assert!(text.contains(&format!("  背景: {}...", "字".repeat(100))));
        assert!(!text.contains(&"字".repeat(101)));
    }
}
