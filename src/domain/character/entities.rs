//! Character Context - Entities

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{CharacterId, TraitId};

/// 关系强度下限
pub const MIN_STRENGTH: f64 = -1.0;
/// 关系强度上限
pub const MAX_STRENGTH: f64 = 1.0;

/// 背景摘要截断长度（字符数）
const BRIEF_BACKGROUND_CHARS: usize = 100;

/// 角色特质
///
/// 特质的 `impact` 只在挂载到角色时叠加一次到性格属性上。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trait {
    pub id: TraitId,
    pub name: String,
    pub description: String,
    /// 对性格属性的影响（属性名 -> 增量）
    pub impact: IndexMap<String, f64>,
}

impl Trait {
    pub fn create(
        name: impl Into<String>,
        description: impl Into<String>,
        impact: IndexMap<String, f64>,
    ) -> Self {
        Self {
            id: TraitId::generate(),
            name: name.into(),
            description: description.into(),
            impact,
        }
    }
}

/// 关系历史记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// 角色间的有向关系
///
/// 不变量:
/// - strength 始终在 [-1.0, 1.0] 内
/// - history 只追加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    target_id: CharacterId,
    relationship_type: String,
    strength: f64,
    history: Vec<HistoryEntry>,
}

impl Relationship {
    /// 新建强度为 0 的关系
    pub fn new(target_id: CharacterId, relationship_type: impl Into<String>) -> Self {
        Self {
            target_id,
            relationship_type: relationship_type.into(),
            strength: 0.0,
            history: Vec::new(),
        }
    }

    /// 从已持久化的数据恢复关系（强度同样被钳制）
    pub fn restore(
        target_id: CharacterId,
        relationship_type: impl Into<String>,
        strength: f64,
        history: Vec<HistoryEntry>,
    ) -> Self {
        Self {
            target_id,
            relationship_type: relationship_type.into(),
            strength: clamp_strength(strength),
            history,
        }
    }

    /// 应用一次强度变化并追加历史
    pub fn apply_change(&mut self, relationship_type: &str, delta: f64, description: &str) {
        self.strength = clamp_strength(self.strength + delta);
        if self.relationship_type != relationship_type {
            self.relationship_type = relationship_type.to_string();
        }
        self.history.push(HistoryEntry {
            timestamp: Utc::now(),
            description: description.to_string(),
        });
    }

    pub fn target_id(&self) -> &CharacterId {
        &self.target_id
    }

    pub fn relationship_type(&self) -> &str {
        &self.relationship_type
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }
}

fn clamp_strength(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(MIN_STRENGTH, MAX_STRENGTH)
}

/// 角色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub background: String,
    pub appearance: String,
    /// 性格属性（属性名 -> 分值，惯例 0~1）
    pub personality: IndexMap<String, f64>,
    pub traits: Vec<Trait>,
    /// 目标角色 ID -> 关系
    pub relationships: IndexMap<CharacterId, Relationship>,
    pub status: IndexMap<String, String>,
    /// 角色经历的故事情节
    pub story_arcs: Vec<String>,
    pub goals: Vec<String>,
    pub notes: String,
}

impl Character {
    /// 创建新角色（仅设置必需字段）
    pub fn create(
        name: impl Into<String>,
        age: u32,
        gender: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        Self::with_id(CharacterId::generate(), name, age, gender, background)
    }

    pub fn with_id(
        id: CharacterId,
        name: impl Into<String>,
        age: u32,
        gender: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            gender: gender.into(),
            background: background.into(),
            appearance: String::new(),
            personality: IndexMap::new(),
            traits: Vec::new(),
            relationships: IndexMap::new(),
            status: IndexMap::new(),
            story_arcs: Vec::new(),
            goals: Vec::new(),
            notes: String::new(),
        }
    }

    /// 解析失败时使用的占位角色
    pub fn placeholder() -> Self {
        Self::create("未知角色", 30, "未指定", "因解析错误生成的角色")
    }

    /// 挂载特质，并把影响一次性叠加到性格属性上
    pub fn add_trait(&mut self, new_trait: Trait) {
        for (attribute, value) in &new_trait.impact {
            *self.personality.entry(attribute.clone()).or_insert(0.0) += *value;
        }
        self.traits.push(new_trait);
    }

    /// 更新对另一角色的关系（单向），不存在时创建
    pub fn update_relationship(
        &mut self,
        target_id: &CharacterId,
        relationship_type: &str,
        delta: f64,
        description: &str,
    ) -> &Relationship {
        let relationship = self
            .relationships
            .entry(target_id.clone())
            .or_insert_with(|| Relationship::new(target_id.clone(), relationship_type));
        relationship.apply_change(relationship_type, delta, description);
        relationship
    }

    pub fn relationship(&self, target_id: &CharacterId) -> Option<&Relationship> {
        self.relationships.get(target_id)
    }

    /// 简要信息，用于提示词中的角色摘要
    pub fn brief_info(&self) -> String {
        let background: String = self.background.chars().take(BRIEF_BACKGROUND_CHARS).collect();
        format!(
            "{}(ID:{}): {}岁, {}, 背景: {}...",
            self.name, self.id, self.age, self.gender, background
        )
    }

    /// 大小写不敏感匹配名称与背景（query 需已小写）
    pub fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query) || self.background.to_lowercase().contains(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Character {
        Character::create("Alice", 20, "女", "出身于北方小镇")
    }

    #[test]
    fn test_create_leaves_collections_empty() {
        let character = alice();
        assert!(character.id.as_str().starts_with("char_"));
        assert!(character.traits.is_empty());
        assert!(character.relationships.is_empty());
        assert!(character.goals.is_empty());
    }

    #[test]
    fn test_add_trait_folds_impact_once() {
        let mut character = alice();
        character.personality.insert("勇气".to_string(), 0.5);

        let mut impact = IndexMap::new();
        impact.insert("勇气".to_string(), 0.2);
        impact.insert("智慧".to_string(), 0.1);
        character.add_trait(Trait::create("无畏", "从不退缩", impact));

        assert!((character.personality["勇气"] - 0.7).abs() < 1e-9);
        assert!((character.personality["智慧"] - 0.1).abs() < 1e-9);
        assert_eq!(character.traits.len(), 1);
    }

    #[test]
    fn test_update_relationship_creates_and_records_history() {
        let mut character = alice();
        let target = CharacterId::from("char_bbbbbbbb");

        character.update_relationship(&target, "朋友", 0.3, "一起冒险");
        let rel = character.update_relationship(&target, "挚友", 0.2, "并肩作战");

        assert_eq!(rel.relationship_type(), "挚友");
        assert!((rel.strength() - 0.5).abs() < 1e-9);
        assert_eq!(rel.history().len(), 2);
        assert_eq!(rel.history()[1].description, "并肩作战");
    }

    #[test]
    fn test_strength_is_clamped_for_any_delta_sequence() {
        let mut character = alice();
        let target = CharacterId::from("char_bbbbbbbb");
        let deltas = [0.9, 0.9, -5.0, 3.3, -0.4, f64::MAX, -f64::MAX, 0.25, f64::NAN];

        for delta in deltas {
            let rel = character.update_relationship(&target, "对手", delta, "冲突");
            assert!(rel.strength() >= MIN_STRENGTH && rel.strength() <= MAX_STRENGTH);
        }
    }

    #[test]
    fn test_restore_clamps_strength() {
        let rel = Relationship::restore(CharacterId::from("char_x"), "敌人", -3.0, Vec::new());
        assert_eq!(rel.strength(), -1.0);
    }

    #[test]
    fn test_brief_info_truncates_background() {
        let mut character = alice();
        character.background = "长".repeat(150);
        let brief = character.brief_info();
        assert!(brief.contains(&"长".repeat(100)));
        assert!(!brief.contains(&"长".repeat(101)));
        assert!(brief.contains("20岁"));
    }

    #[test]
    fn test_placeholder_is_marked() {
        assert!(Character::placeholder().name.contains("未知"));
    }
}
