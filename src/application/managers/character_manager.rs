//! Character Manager - 角色管理

use indexmap::IndexMap;
use std::sync::Arc;

use super::GenerationSettings;
use crate::application::commands::{
    CharacterUpdate, CreateCharacter, RelationshipDirection, UpdateRelationship,
};
use crate::application::error::ApplicationError;
use crate::application::parsing::parse_character;
use crate::application::ports::{OraclePort, OracleRequest};
use crate::application::prompts::PromptTemplates;
use crate::application::services::digest;
use crate::domain::{Character, CharacterId, Novel, Trait};

pub struct CharacterManager {
    oracle: Arc<dyn OraclePort>,
    templates: Arc<PromptTemplates>,
    settings: GenerationSettings,
}

impl CharacterManager {
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

    /// 手动创建角色
    pub fn create_character<'a>(&self, novel: &'a mut Novel, command: CreateCharacter) -> &'a Character {
        let character = Character::create(
            command.name,
            command.age,
            command.gender,
            command.background,
        );
        tracing::info!(
            novel_id = %novel.id(),
            character_id = %character.id,
            name = %character.name,
            "Character created"
        );
        novel.add_character(character)
    }

    /// 通过 Oracle 生成角色；响应无法解析时注册占位角色
    pub async fn generate_character<'a>(
        &self,
        novel: &'a mut Novel,
    ) -> Result<&'a Character, ApplicationError> {
        let background_info = digest::background_info(novel);
        let prompt = PromptTemplates::render(
            &self.templates.character,
            &[
                ("genre", novel.genre()),
                ("background_info", background_info.as_str()),
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

        let character = parse_character(&response).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Character response unparseable, using placeholder");
            Character::placeholder()
        });

        tracing::info!(
            novel_id = %novel.id(),
            character_id = %character.id,
            name = %character.name,
            "Character generated"
        );
        Ok(novel.add_character(character))
    }

    /// 批量生成角色；单个失败被记录后跳过
    pub async fn generate_characters(&self, novel: &mut Novel, count: usize) -> Vec<CharacterId> {
        let mut generated = Vec::with_capacity(count);
        for index in 0..count {
            match self.generate_character(novel).await {
                Ok(character) => generated.push(character.id.clone()),
                Err(e) => {
                    tracing::error!(index = index, count = count, error = %e, "Character generation failed");
                }
            }
        }
        generated
    }

    pub fn update_character<'a>(
        &self,
        novel: &'a mut Novel,
        id: &CharacterId,
        update: CharacterUpdate,
    ) -> Option<&'a Character> {
        let character = novel.character_mut(id)?;
        update.apply_to(character);
        novel.touch();
        tracing::info!(character_id = %id, "Character updated");
        novel.character(id)
    }

    /// 删除角色，并清理所有指向它的关系
    pub fn delete_character(&self, novel: &mut Novel, id: &CharacterId) -> bool {
        match novel.remove_character(id) {
            Some(removed) => {
                tracing::info!(character_id = %id, name = %removed.name, "Character deleted");
                true
            }
            None => false,
        }
    }

    /// 为角色添加特质，特质影响一次性叠加到性格属性
    pub fn add_trait<'a>(
        &self,
        novel: &'a mut Novel,
        id: &CharacterId,
        name: impl Into<String>,
        description: impl Into<String>,
        impact: IndexMap<String, f64>,
    ) -> Option<&'a Trait> {
        let character = novel.character_mut(id)?;
        character.add_trait(Trait::create(name, description, impact));
        tracing::info!(character_id = %id, traits = character.traits.len(), "Trait added");
        novel.touch();
        novel.character(id).and_then(|character| character.traits.last())
    }

    /// 更新关系；任一角色不存在时返回 false
    pub fn update_relationship(&self, novel: &mut Novel, command: UpdateRelationship) -> bool {
        if novel.character(&command.from).is_none() || novel.character(&command.to).is_none() {
            return false;
        }

        novel.update_relationship(
            &command.from,
            &command.to,
            &command.relationship_type,
            command.delta,
            &command.description,
        );
        if command.direction == RelationshipDirection::Mutual {
            novel.update_relationship(
                &command.to,
                &command.from,
                &command.relationship_type,
                command.delta,
                &command.description,
            );
        }

        tracing::info!(
            from = %command.from,
            to = %command.to,
            relationship_type = %command.relationship_type,
            delta = command.delta,
            direction = ?command.direction,
            "Relationship updated"
        );
        true
    }

    pub fn get_all_characters<'a>(&self, novel: &'a Novel) -> Vec<&'a Character> {
        novel.characters().values().collect()
    }

    pub fn get_character<'a>(&self, novel: &'a Novel, id: &CharacterId) -> Option<&'a Character> {
        novel.character(id)
    }

    /// 按名称与背景做大小写不敏感的子串搜索
    pub fn search_characters<'a>(&self, novel: &'a Novel, query: &str) -> Vec<&'a Character> {
        let query = query.to_lowercase();
        novel
            .characters()
            .values()
            .filter(|character| character.matches(&query))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::OracleError;
    use crate::infrastructure::adapters::ScriptedOracle;

    const HERO: &str = r#"<character>
    <name>林风</name><age>24</age><gender>男</gender>
    <background>边境小镇的铁匠之子</background>
    <appearance>高大</appearance>
    <personality><trait name="勇气">0.8</trait></personality>
    <goals><goal>复仇</goal></goals>
</character>"#;

    fn manager(oracle: Arc<ScriptedOracle>) -> CharacterManager {
        CharacterManager::new(
            oracle,
            Arc::new(PromptTemplates::default()),
            GenerationSettings::default(),
        )
    }

    fn novel() -> Novel {
        Novel::create("风起", "武侠", "江湖")
    }

    fn create(manager: &CharacterManager, novel: &mut Novel, name: &str) -> CharacterId {
        manager
            .create_character(
                novel,
                CreateCharacter {
                    name: name.to_string(),
                    age: 20,
                    gender: "女".to_string(),
                    background: format!("{}的背景", name),
                },
            )
            .id
            .clone()
    }

    #[tokio::test]
    async fn test_generate_character_registers_parsed_character() {
        let oracle = Arc::new(ScriptedOracle::with_replies([HERO]));
        let manager = manager(oracle.clone());
        let mut novel = novel();
        novel.context_mut().global_context = "乱世".to_string();

        let character = manager.generate_character(&mut novel).await.unwrap();
        assert_eq!(character.name, "林风");
        assert_eq!(character.appearance, "高大");
        assert_eq!(novel.characters().len(), 1);

        let request = &oracle.requests()[0];
        assert!(request.prompt.contains("这个角色生活在江湖世界中，这是一部武侠类型的小说。"));
        assert!(request.prompt.contains("<context>乱世</context>"));
        assert_eq!(request.max_tokens, 2000);
    }

    #[tokio::test]
    async fn test_generate_character_placeholder_on_garbage() {
        let oracle = Arc::new(ScriptedOracle::with_replies(["我拒绝"]));
        let manager = manager(oracle);
        let mut novel = novel();

        let character = manager.generate_character(&mut novel).await.unwrap();
        assert_eq!(character.name, "未知角色");
        assert_eq!(character.age, 30);
        assert_eq!(novel.characters().len(), 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_leaves_novel_untouched() {
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.push_error(OracleError::Unavailable {
            attempts: 3,
            last_error: "down".to_string(),
        });
        let manager = manager(oracle);
        let mut novel = novel();
        let before = novel.last_modified();

        let result = manager.generate_character(&mut novel).await;
        assert!(matches!(result, Err(ApplicationError::Oracle(_))));
        assert!(novel.characters().is_empty());
        assert_eq!(novel.last_modified(), before);
    }

    #[tokio::test]
    async fn test_batch_generation_continues_past_failures() {
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.push_reply(HERO);
        oracle.push_error(OracleError::Unavailable {
            attempts: 3,
            last_error: "down".to_string(),
        });
        oracle.push_reply("not xml");
        let manager = manager(oracle);
        let mut novel = novel();

        let ids = manager.generate_characters(&mut novel, 3).await;
        assert_eq!(ids.len(), 2);
        assert_eq!(novel.characters().len(), 2);
    }

    #[test]
    fn test_update_and_search() {
        let manager = manager(Arc::new(ScriptedOracle::new()));
        let mut novel = novel();
        let id = create(&manager, &mut novel, "Alice");
        create(&manager, &mut novel, "Bob");

        let update = CharacterUpdate {
            background: Some("来自北方的剑客".to_string()),
            ..Default::default()
        };
        let updated = manager.update_character(&mut novel, &id, update).unwrap();
        assert_eq!(updated.background, "来自北方的剑客");

        assert_eq!(manager.search_characters(&novel, "ALICE").len(), 1);
        assert_eq!(manager.search_characters(&novel, "剑客").len(), 1);
        assert!(manager.search_characters(&novel, "carol").is_empty());
        assert_eq!(manager.get_all_characters(&novel).len(), 2);

        let missing = CharacterId::from("char_missing");
        assert!(manager
            .update_character(&mut novel, &missing, CharacterUpdate::default())
            .is_none());
    }

    #[test]
    fn test_add_trait_folds_impact() {
        let manager = manager(Arc::new(ScriptedOracle::new()));
        let mut novel = novel();
        let id = create(&manager, &mut novel, "Alice");

        let impact = IndexMap::from([("勇气".to_string(), 0.3)]);
        let added = manager
            .add_trait(&mut novel, &id, "无畏", "从不退缩", impact.clone())
            .unwrap();
        assert_eq!(added.name, "无畏");
        manager.add_trait(&mut novel, &id, "莽撞", "", impact);

        let alice = novel.character(&id).unwrap();
        assert_eq!(alice.traits.len(), 2);
        assert!((alice.personality["勇气"] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_relationship_directions_and_cascade() {
        let manager = manager(Arc::new(ScriptedOracle::new()));
        let mut novel = novel();
        let a = create(&manager, &mut novel, "A");
        let b = create(&manager, &mut novel, "B");
        let c = create(&manager, &mut novel, "C");

        let command = |from: &CharacterId, to: &CharacterId, direction| UpdateRelationship {
            from: from.clone(),
            to: to.clone(),
            relationship_type: "朋友".to_string(),
            delta: 0.7,
            description: "同行".to_string(),
            direction,
        };

        assert!(manager.update_relationship(&mut novel, command(&a, &b, RelationshipDirection::OneWay)));
        assert!(novel.character(&b).unwrap().relationship(&a).is_none());

        assert!(manager.update_relationship(&mut novel, command(&c, &b, RelationshipDirection::Mutual)));
        assert!(manager.update_relationship(&mut novel, command(&c, &b, RelationshipDirection::Mutual)));
        let strength = novel.character(&b).unwrap().relationship(&c).unwrap().strength();
        assert_eq!(strength, 1.0);

        let ghost = CharacterId::from("char_ghost");
        assert!(!manager.update_relationship(&mut novel, command(&a, &ghost, RelationshipDirection::OneWay)));

        assert!(manager.delete_character(&mut novel, &b));
        assert!(!manager.delete_character(&mut novel, &b));
        for character in novel.characters().values() {
            assert!(character.relationship(&b).is_none());
        }
    }
}
