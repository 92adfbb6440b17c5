//! Character Commands

use indexmap::IndexMap;

use crate::domain::{Character, CharacterId};

/// 手动创建角色
#[derive(Debug, Clone)]
pub struct CreateCharacter {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub background: String,
}

/// 角色部分更新
///
/// `personality` 与 `status` 按键合并，`goals` 与 `story_arcs` 整体替换。
#[derive(Debug, Clone, Default)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub background: Option<String>,
    pub appearance: Option<String>,
    pub personality: Option<IndexMap<String, f64>>,
    pub status: Option<IndexMap<String, String>>,
    pub goals: Option<Vec<String>>,
    pub story_arcs: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl CharacterUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.background.is_none()
            && self.appearance.is_none()
            && self.personality.is_none()
            && self.status.is_none()
            && self.goals.is_none()
            && self.story_arcs.is_none()
            && self.notes.is_none()
    }

    pub fn apply_to(self, character: &mut Character) {
        if let Some(name) = self.name {
            character.name = name;
        }
        if let Some(age) = self.age {
            character.age = age;
        }
        if let Some(gender) = self.gender {
            character.gender = gender;
        }
        if let Some(background) = self.background {
            character.background = background;
        }
        if let Some(appearance) = self.appearance {
            character.appearance = appearance;
        }
        if let Some(personality) = self.personality {
            character.personality.extend(personality);
        }
        if let Some(status) = self.status {
            character.status.extend(status);
        }
        if let Some(goals) = self.goals {
            character.goals = goals;
        }
        if let Some(story_arcs) = self.story_arcs {
            character.story_arcs = story_arcs;
        }
        if let Some(notes) = self.notes {
            character.notes = notes;
        }
    }
}

/// 关系更新的方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelationshipDirection {
    /// 只更新 from → to
    #[default]
    OneWay,
    /// 同时更新 from → to 与 to → from
    Mutual,
}

/// 更新角色关系
#[derive(Debug, Clone)]
pub struct UpdateRelationship {
    pub from: CharacterId,
    pub to: CharacterId,
    pub relationship_type: String,
    /// 强度增量（结果夹到 [-1, 1]）
    pub delta: f64,
    /// 写入关系历史的说明
    pub description: String,
    pub direction: RelationshipDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_merges_maps_and_replaces_lists() {
        let mut character = Character::create("Alice", 20, "女", "北方小镇");
        character.personality.insert("勇气".to_string(), 0.5);
        character.goals.push("旧目标".to_string());

        let update = CharacterUpdate {
            age: Some(21),
            personality: Some(IndexMap::from([("智慧".to_string(), 0.7)])),
            goals: Some(vec!["新目标".to_string()]),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply_to(&mut character);

        assert_eq!(character.age, 21);
        assert_eq!(character.name, "Alice");
        assert_eq!(character.personality.len(), 2);
        assert_eq!(character.goals, vec!["新目标"]);
    }

    #[test]
    fn test_empty_update_changes_nothing() {
        let mut character = Character::create("Alice", 20, "女", "北方小镇");
        let before = character.clone();
        let update = CharacterUpdate::default();
        assert!(update.is_empty());
        update.apply_to(&mut character);
        assert_eq!(character, before);
    }
}
