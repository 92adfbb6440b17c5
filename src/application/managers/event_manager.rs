//! Event Manager - 事件库管理

use std::sync::Arc;

use super::GenerationSettings;
use crate::application::commands::{CreateEvent, EventUpdate};
use crate::application::error::ApplicationError;
use crate::application::parsing::parse_events;
use crate::application::ports::{OraclePort, OracleRequest};
use crate::application::prompts::PromptTemplates;
use crate::application::services::{digest, EventEngine};
use crate::domain::{CharacterId, Event, EventId, Novel};

pub struct EventManager {
    oracle: Arc<dyn OraclePort>,
    engine: Arc<EventEngine>,
    templates: Arc<PromptTemplates>,
    settings: GenerationSettings,
}

impl EventManager {
    pub fn new(
        oracle: Arc<dyn OraclePort>,
        engine: Arc<EventEngine>,
        templates: Arc<PromptTemplates>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            oracle,
            engine,
            templates,
            settings,
        }
    }

    /// 手动创建事件
    pub fn create_event<'a>(&self, novel: &'a mut Novel, command: CreateEvent) -> &'a Event {
        let event = Event::create(command.name, command.description);
        tracing::info!(novel_id = %novel.id(), event_id = %event.id, name = %event.name, "Event created");
        novel.add_event(event)
    }

    /// 通过 Oracle 生成一批事件并加入事件库
    ///
    /// 响应无法解析时注册单个占位事件。
    pub async fn generate_events<'a>(
        &self,
        novel: &'a mut Novel,
        num_events: usize,
    ) -> Result<Vec<&'a Event>, ApplicationError> {
        let characters_info = digest::characters_info(novel);
        let current_chapter = novel.current_chapter().to_string();
        let num_events_text = num_events.to_string();
        let prompt = PromptTemplates::render(
            &self.templates.events,
            &[
                ("title", novel.title()),
                ("genre", novel.genre()),
                ("setting", novel.setting()),
                ("current_chapter", current_chapter.as_str()),
                ("characters_info", characters_info.as_str()),
                ("context", novel.context().global_context.as_str()),
                ("num_events", num_events_text.as_str()),
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

        let events = parse_events(&response).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Events response unparseable, using placeholder");
            vec![Event::placeholder()]
        });

        let ids: Vec<EventId> = events
            .into_iter()
            .map(|event| novel.add_event(event).id.clone())
            .collect();

        tracing::info!(
            novel_id = %novel.id(),
            requested = num_events,
            generated = ids.len(),
            "Events generated"
        );

        let novel: &'a Novel = novel;
        Ok(ids.iter().filter_map(|id| novel.event(id)).collect())
    }

    pub fn update_event<'a>(
        &self,
        novel: &'a mut Novel,
        id: &EventId,
        update: EventUpdate,
    ) -> Option<&'a Event> {
        let event = novel.event_mut(id)?;
        update.apply_to(event);
        novel.touch();
        tracing::info!(event_id = %id, "Event updated");
        novel.event(id)
    }

    /// 删除事件，并从所有章节的事件引用中移除
    pub fn delete_event(&self, novel: &mut Novel, id: &EventId) -> bool {
        match novel.remove_event(id) {
            Some(removed) => {
                tracing::info!(event_id = %id, name = %removed.name, "Event deleted");
                true
            }
            None => false,
        }
    }

    pub fn get_all_events<'a>(&self, novel: &'a Novel) -> Vec<&'a Event> {
        novel.events_library().values().collect()
    }

    pub fn get_event<'a>(&self, novel: &'a Novel, id: &EventId) -> Option<&'a Event> {
        novel.event(id)
    }

    /// 按名称与描述做大小写不敏感的子串搜索
    pub fn search_events<'a>(&self, novel: &'a Novel, query: &str) -> Vec<&'a Event> {
        let query = query.to_lowercase();
        novel
            .events_library()
            .values()
            .filter(|event| event.matches(&query))
            .collect()
    }

    /// 把事件效果作用到一组角色上（关系双向更新）
    ///
    /// 事件不存在时返回 None，否则返回单向关系更新次数。
    pub fn apply_event(
        &self,
        novel: &mut Novel,
        id: &EventId,
        affected_characters: &[CharacterId],
    ) -> Option<usize> {
        let event = novel.event(id)?.clone();
        Some(self.engine.apply_event_effects(&event, novel, affected_characters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FixedRandom;
    use crate::domain::{Chapter, Character, EventEffect};
    use crate::infrastructure::adapters::ScriptedOracle;

    const EVENTS: &str = r#"这里是事件：
<events>
    <event>
        <id>e1</id><name>背叛</name><description>盟友倒戈</description>
        <effects><effect target="character_relation" value="-0.3"/></effects>
    </event>
    <event><id>e2</id><name>重逢</name><description>旧友重逢</description></event>
</events>"#;

    fn manager(oracle: Arc<ScriptedOracle>) -> EventManager {
        EventManager::new(
            oracle,
            Arc::new(EventEngine::new(Arc::new(FixedRandom::new(vec![], 0)))),
            Arc::new(PromptTemplates::default()),
            GenerationSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_generate_events_adds_all_parsed_events() {
        let oracle = Arc::new(ScriptedOracle::with_replies([EVENTS]));
        let manager = manager(oracle.clone());
        let mut novel = Novel::create("风起", "武侠", "江湖");
        novel.add_character(Character::create("林风", 24, "男", "铁匠之子"));

        let events = manager.generate_events(&mut novel, 2).await.unwrap();
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["背叛", "重逢"]);
        assert_eq!(novel.events_library().len(), 2);

        let prompt = &oracle.requests()[0].prompt;
        assert!(prompt.contains("Please generate 2 potential events"));
        assert!(prompt.contains("林风(ID:"));
        assert!(prompt.contains("{character_name}"));
    }

    #[tokio::test]
    async fn test_generate_events_placeholder_on_truncated_reply() {
        let oracle = Arc::new(ScriptedOracle::with_replies(["<events><event><name>半截"]));
        let manager = manager(oracle);
        let mut novel = Novel::create("风起", "武侠", "江湖");

        let events = manager.generate_events(&mut novel, 5).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "默认事件");
    }

    #[test]
    fn test_delete_event_cascades_to_chapters() {
        let manager = manager(Arc::new(ScriptedOracle::new()));
        let mut novel = Novel::create("风起", "武侠", "江湖");
        let command = CreateEvent {
            name: "大火".to_string(),
            description: "小镇起火".to_string(),
        };
        let id = manager.create_event(&mut novel, command).id.clone();

        let mut chapter = Chapter::create(1, "第一章");
        chapter.events.push(id.clone());
        novel.push_chapter(chapter);

        assert!(manager.delete_event(&mut novel, &id));
        assert!(novel.chapter(1).unwrap().events.is_empty());
        assert!(!manager.delete_event(&mut novel, &id));
    }

    #[test]
    fn test_update_search_and_apply() {
        let manager = manager(Arc::new(ScriptedOracle::new()));
        let mut novel = Novel::create("风起", "武侠", "江湖");
        let a = novel.add_character(Character::create("A", 20, "男", "")).id.clone();
        let b = novel.add_character(Character::create("B", 20, "女", "")).id.clone();
        let command = CreateEvent {
            name: "结盟".to_string(),
            description: "两派结盟".to_string(),
        };
        let id = manager.create_event(&mut novel, command).id.clone();

        let update = EventUpdate {
            effects: Some(vec![EventEffect::character_relation(0.2)]),
            ..Default::default()
        };
        assert!(manager.update_event(&mut novel, &id, update).is_some());
        assert_eq!(manager.search_events(&novel, "两派").len(), 1);

        assert_eq!(manager.apply_event(&mut novel, &id, &[a.clone(), b.clone()]), Some(2));
        let rel = novel.character(&a).unwrap().relationship(&b).unwrap();
        assert!((rel.strength() - 0.2).abs() < 1e-9);

        let missing = EventId::from("event_missing");
        assert_eq!(manager.apply_event(&mut novel, &missing, &[a, b]), None);
    }
}
