//! Outline Manager - 大纲管理

use std::sync::Arc;

use super::GenerationSettings;
use crate::application::commands::OutlineUpdate;
use crate::application::error::ApplicationError;
use crate::application::parsing::parse_outline;
use crate::application::ports::{OraclePort, OracleRequest};
use crate::application::prompts::PromptTemplates;
use crate::application::services::digest;
use crate::domain::{Novel, Outline, OutlineArc};

/// 添加情节弧时若无大纲，自动创建的大纲概述
const DEFAULT_OVERVIEW: &str = "默认大纲";

pub struct OutlineManager {
    oracle: Arc<dyn OraclePort>,
    templates: Arc<PromptTemplates>,
    settings: GenerationSettings,
}

impl OutlineManager {
    pub fn new(
        oracle: Arc<dyn OraclePort>,
        templates: Arc<PromptTemplates>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            oracle,
            templates,
            settings,
        }
    }

    /// 手动创建大纲（替换已有大纲）
    pub fn create_outline<'a>(&self, novel: &'a mut Novel, overview: impl Into<String>) -> &'a Outline {
        tracing::info!(novel_id = %novel.id(), "Outline created");
        novel.set_outline(Outline::create(overview))
    }

    /// 通过 Oracle 生成大纲（替换已有大纲）；响应无法解析时使用占位大纲
    pub async fn generate_outline<'a>(
        &self,
        novel: &'a mut Novel,
    ) -> Result<&'a Outline, ApplicationError> {
        let characters_info = digest::characters_info(novel);
        let prompt = PromptTemplates::render(
            &self.templates.outline,
            &[
                ("title", novel.title()),
                ("genre", novel.genre()),
                ("setting", novel.setting()),
                ("characters_info", characters_info.as_str()),
                ("context", novel.context().global_context.as_str()),
            ],
        );

        let response = self
            .oracle
            .generate(OracleRequest::new(
                prompt,
                self.settings.temperature,
                self.settings.max_tokens,
            ))
            .await?;

        let outline = parse_outline(&response).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Outline response unparseable, using placeholder");
            Outline::placeholder()
        });

        tracing::info!(novel_id = %novel.id(), arcs = outline.arcs.len(), "Outline generated");
        Ok(novel.set_outline(outline))
    }

    /// 更新大纲；没有大纲时返回 None
    pub fn update_outline<'a>(&self, novel: &'a mut Novel, update: OutlineUpdate) -> Option<&'a Outline> {
        update.apply_to(novel.outline_mut()?);
        novel.touch();
        tracing::info!(novel_id = %novel.id(), "Outline updated");
        novel.outline()
    }

    /// 追加情节弧；没有大纲时先创建默认大纲
    pub fn add_arc<'a>(
        &self,
        novel: &'a mut Novel,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> &'a OutlineArc {
        novel.touch();
        let arcs = &mut novel.outline_or_create(DEFAULT_OVERVIEW).arcs;
        arcs.push(OutlineArc::new(name, description));
        let index = arcs.len() - 1;
        tracing::info!(index = index, "Outline arc added");
        &arcs[index]
    }

    /// 按下标删除情节弧；下标越界或没有大纲时返回 false
    pub fn delete_arc(&self, novel: &mut Novel, index: usize) -> bool {
        let Some(outline) = novel.outline_mut() else {
            return false;
        };
        if index >= outline.arcs.len() {
            return false;
        }
        let removed = outline.arcs.remove(index);
        novel.touch();
        tracing::info!(index = index, name = %removed.name, "Outline arc deleted");
        true
    }

    pub fn get_outline<'a>(&self, novel: &'a Novel) -> Option<&'a Outline> {
        novel.outline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::ScriptedOracle;

    const OUTLINE: &str = r#"<outline>
    <overview>复仇与救赎</overview>
    <arc><name>开端</name><description>小镇被毁</description>
        <key_events><event>大火</event></key_events></arc>
    <arc><name>结局</name><description>归来</description></arc>
</outline>"#;

    fn manager(oracle: Arc<ScriptedOracle>) -> OutlineManager {
        OutlineManager::new(
            oracle,
            Arc::new(PromptTemplates::default()),
            GenerationSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_generate_outline_replaces_existing() {
        let oracle = Arc::new(ScriptedOracle::with_replies([OUTLINE, "<outline>坏了"]));
        let manager = manager(oracle.clone());
        let mut novel = Novel::create("风起", "武侠", "江湖");
        manager.create_outline(&mut novel, "旧大纲");

        let outline = manager.generate_outline(&mut novel).await.unwrap();
        assert_eq!(outline.overview, "复仇与救赎");
        assert_eq!(outline.arcs.len(), 2);
        assert!(oracle.requests()[0].prompt.contains("<title>风起</title>"));

        let outline = manager.generate_outline(&mut novel).await.unwrap();
        assert_eq!(outline.overview, "生成失败的大纲");
        assert!(outline.arcs.is_empty());
    }

    #[test]
    fn test_update_requires_outline() {
        let manager = manager(Arc::new(ScriptedOracle::new()));
        let mut novel = Novel::create("风起", "武侠", "江湖");
        let update = OutlineUpdate {
            overview: Some("新概述".to_string()),
            ..Default::default()
        };
        assert!(manager.update_outline(&mut novel, update.clone()).is_none());

        manager.create_outline(&mut novel, "概述");
        let updated = manager.update_outline(&mut novel, update).unwrap();
        assert_eq!(updated.overview, "新概述");
    }

    #[test]
    fn test_add_and_delete_arcs() {
        let manager = manager(Arc::new(ScriptedOracle::new()));
        let mut novel = Novel::create("风起", "武侠", "江湖");
        assert!(!manager.delete_arc(&mut novel, 0));

        let arc = manager.add_arc(&mut novel, "开端", "相遇");
        assert_eq!(arc.name, "开端");
        manager.add_arc(&mut novel, "高潮", "决战");

        let outline = manager.get_outline(&novel).unwrap();
        assert_eq!(outline.overview, "默认大纲");
        assert_eq!(outline.arcs.len(), 2);

        assert!(!manager.delete_arc(&mut novel, 2));
        assert!(manager.delete_arc(&mut novel, 0));
        assert_eq!(novel.outline().unwrap().arcs[0].name, "高潮");
    }
}
