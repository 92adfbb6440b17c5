//! XML File Store - 文件系统小说存储
//!
//! 实现 NovelStorePort trait，每部小说保存为一个 `.xml` 文件

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

use super::codec::{decode_novel, encode_novel};
use super::text_export::render_manuscript;
use crate::application::ports::{NovelStorePort, SavedNovelInfo, StoreError};
use crate::domain::Novel;

const DOCUMENT_EXTENSION: &str = "xml";

/// XML 文件存储
#[derive(Debug, Default, Clone)]
pub struct XmlFileNovelStore;

impl XmlFileNovelStore {
    pub fn new() -> Self {
        Self
    }
}

async fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }
    Ok(())
}

#[async_trait]
impl NovelStorePort for XmlFileNovelStore {
    async fn save(&self, novel: &Novel, path: &Path) -> Result<(), StoreError> {
        let xml = encode_novel(novel).map_err(|e| StoreError::codec(path, e))?;
        ensure_parent(path).await?;
        fs::write(path, xml.as_bytes())
            .await
            .map_err(|e| StoreError::io(path, e))?;

        tracing::info!(
            novel_id = %novel.id(),
            path = %path.display(),
            size = xml.len(),
            "Novel saved"
        );
        Ok(())
    }

    async fn load(&self, path: &Path) -> Result<Novel, StoreError> {
        let xml = fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        let novel = decode_novel(&xml).map_err(|e| StoreError::codec(path, e))?;

        tracing::info!(
            novel_id = %novel.id(),
            path = %path.display(),
            chapters = novel.chapters().len(),
            "Novel loaded"
        );
        Ok(novel)
    }

    async fn list(&self, dir: &Path) -> Result<Vec<SavedNovelInfo>, StoreError> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StoreError::io(dir, e))?;

        let mut entries = fs::read_dir(dir).await.map_err(|e| StoreError::io(dir, e))?;
        let mut result = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }

            match self.load(&path).await {
                Ok(novel) => result.push(SavedNovelInfo {
                    filename: entry.file_name().to_string_lossy().into_owned(),
                    title: novel.title().to_string(),
                    genre: novel.genre().to_string(),
                    chapters: novel.chapters().len(),
                    last_modified: novel.last_modified(),
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable novel file");
                }
            }
        }

        result.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(result)
    }

    async fn export_text(&self, novel: &Novel, path: &Path) -> Result<(), StoreError> {
        let text = render_manuscript(novel);
        ensure_parent(path).await?;
        fs::write(path, text.as_bytes())
            .await
            .map_err(|e| StoreError::io(path, e))?;

        tracing::info!(novel_id = %novel.id(), path = %path.display(), "Novel exported as text");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Chapter, Character};
    use tempfile::TempDir;

    fn sample_novel(title: &str) -> Novel {
        let mut novel = Novel::create(title, "武侠", "江湖");
        novel.add_character(Character::create("林风", 24, "男", "铁匠之子"));
        let mut chapter = Chapter::create(1, "风起");
        chapter.content = "正文".to_string();
        novel.push_chapter(chapter);
        novel
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saves").join("novel.xml");
        let store = XmlFileNovelStore::new();
        let novel = sample_novel("剑影");

        store.save(&novel, &path).await.unwrap();
        let loaded = store.load(&path).await.unwrap();
        assert_eq!(loaded, novel);
    }

    #[tokio::test]
    async fn test_load_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let store = XmlFileNovelStore::new();

        let missing = dir.path().join("missing.xml");
        assert!(matches!(store.load(&missing).await, Err(StoreError::Io { .. })));

        let corrupt = dir.path().join("corrupt.xml");
        std::fs::write(&corrupt, "<novel><id>x").unwrap();
        assert!(matches!(store.load(&corrupt).await, Err(StoreError::Codec { .. })));
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = XmlFileNovelStore::new();
        store.save(&sample_novel("甲"), &dir.path().join("a.xml")).await.unwrap();
        store.save(&sample_novel("乙"), &dir.path().join("b.xml")).await.unwrap();
        std::fs::write(dir.path().join("broken.xml"), "not xml").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let listed = store.list(dir.path()).await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|info| info.title.as_str()).collect();
        assert_eq!(titles, vec!["甲", "乙"]);
        assert_eq!(listed[0].filename, "a.xml");
        assert_eq!(listed[0].chapters, 1);
    }

    #[tokio::test]
    async fn test_list_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let saves = dir.path().join("saves");
        let listed = XmlFileNovelStore::new().list(&saves).await.unwrap();
        assert!(listed.is_empty());
        assert!(saves.is_dir());
    }

    #[tokio::test]
    async fn test_export_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exports").join("剑影.txt");
        let store = XmlFileNovelStore::new();

        store.export_text(&sample_novel("剑影"), &path).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("《剑影》"));
        assert!(text.contains("第1章: 风起"));
    }
}
