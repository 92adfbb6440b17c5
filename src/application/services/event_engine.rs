//! Event Engine - 事件选择与效果应用

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::application::ports::RandomPort;
use crate::domain::{CharacterId, EffectTarget, Event, Novel};

/// 每章默认选取的事件数
pub const DEFAULT_MAX_EVENTS: usize = 3;

/// 事件效果写入关系时使用的类型标签
pub const EVENT_RELATION_TYPE: &str = "受事件影响";

const BASE_SCORE: f64 = 1.0;
const SCORE_JITTER: f64 = 0.5;

/// 事件引擎
pub struct EventEngine {
    random: Arc<dyn RandomPort>,
}

impl EventEngine {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self { random }
    }

    /// 为下一章挑选事件：每个事件得分 1.0 + [0, 0.5) 抖动，按分数降序取前 max_events 个
    pub fn select_events_for_chapter<'a>(&self, novel: &'a Novel, max_events: usize) -> Vec<&'a Event> {
        let mut scored: Vec<(&Event, f64)> = novel
            .events_library()
            .values()
            .map(|event| (event, self.score(event)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(max_events);
        scored.into_iter().map(|(event, _)| event).collect()
    }

    fn score(&self, _event: &Event) -> f64 {
        BASE_SCORE + self.random.random_f64() * SCORE_JITTER
    }

    /// 不评分的随机抽样，选择结果为空时的兜底
    pub fn sample_events<'a>(&self, novel: &'a Novel, amount: usize) -> Vec<&'a Event> {
        let library = novel.events_library();
        self.random
            .sample_indices(library.len(), amount)
            .into_iter()
            .filter_map(|index| library.get_index(index).map(|(_, event)| event))
            .collect()
    }

    /// 应用事件效果
    ///
    /// `character_relation` 效果作用于受影响角色的每个无序对，双向各更新一次。
    /// 重复的角色 ID 只计一次。其他目标暂不解释。返回实际执行的单向关系更新次数。
    pub fn apply_event_effects(
        &self,
        event: &Event,
        novel: &mut Novel,
        affected_characters: &[CharacterId],
    ) -> usize {
        let note = format!("事件'{}'影响了关系", event.name);
        let mut seen = HashSet::new();
        let affected: Vec<&CharacterId> = affected_characters
            .iter()
            .filter(|id| seen.insert(*id))
            .collect();
        let mut updates = 0;

        for effect in &event.effects {
            if effect.target != EffectTarget::CharacterRelation {
                tracing::debug!(
                    event_id = %event.id,
                    effect_target = %effect.target,
                    "Skipping uninterpreted event effect"
                );
                continue;
            }

            for (i, first) in affected.iter().enumerate() {
                for second in &affected[i + 1..] {
                    for (from, to) in [(first, second), (second, first)] {
                        if novel.update_relationship(from, to, EVENT_RELATION_TYPE, effect.value, &note) {
                            updates += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            event_id = %event.id,
            event_name = %event.name,
            affected = affected.len(),
            updates = updates,
            "Event effects applied"
        );
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FixedRandom;
    use crate::domain::{Character, EventEffect};

    fn novel_with_events(count: usize) -> Novel {
        let mut novel = Novel::create("测试", "奇幻", "大陆");
        for i in 0..count {
            novel.add_event(Event::create(format!("事件{}", i), "描述"));
        }
        novel
    }

    #[test]
    fn test_select_events_orders_by_score() {
        let novel = novel_with_events(4);
        let engine = EventEngine::new(Arc::new(FixedRandom::new(vec![0.1, 0.9, 0.5, 0.3], 0)));

        let selected = engine.select_events_for_chapter(&novel, DEFAULT_MAX_EVENTS);
        let names: Vec<&str> = selected.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["事件1", "事件2", "事件3"]);
    }

    #[test]
    fn test_select_events_empty_library() {
        let novel = novel_with_events(0);
        let engine = EventEngine::new(Arc::new(FixedRandom::new(vec![], 0)));
        assert!(engine.select_events_for_chapter(&novel, 3).is_empty());
    }

    #[test]
    fn test_select_events_fewer_than_max() {
        let novel = novel_with_events(2);
        let engine = EventEngine::new(Arc::new(FixedRandom::new(vec![], 0)));
        assert_eq!(engine.select_events_for_chapter(&novel, 3).len(), 2);
    }

    #[test]
    fn test_sample_events_caps_at_library_size() {
        let novel = novel_with_events(2);
        let engine = EventEngine::new(Arc::new(FixedRandom::new(vec![], 0)));
        assert_eq!(engine.sample_events(&novel, 3).len(), 2);
    }

    #[test]
    fn test_apply_effects_to_two_characters() {
        let mut novel = Novel::create("测试", "奇幻", "大陆");
        let a = novel.add_character(Character::create("A", 20, "男", "")).id.clone();
        let b = novel.add_character(Character::create("B", 22, "女", "")).id.clone();
        let mut event = Event::create("结盟", "两人结为盟友");
        event.effects.push(EventEffect::character_relation(0.2));

        let engine = EventEngine::new(Arc::new(FixedRandom::new(vec![], 0)));
        let updates = engine.apply_event_effects(&event, &mut novel, &[a.clone(), b.clone()]);
        assert_eq!(updates, 2);

        for (from, to) in [(&a, &b), (&b, &a)] {
            let rel = novel.character(from).unwrap().relationship(to).unwrap();
            assert!((rel.strength() - 0.2).abs() < 1e-9);
            assert_eq!(rel.relationship_type(), EVENT_RELATION_TYPE);
            assert_eq!(rel.history().len(), 1);
            assert!(rel.history()[0].description.contains("结盟"));
        }
    }

    #[test]
    fn test_apply_effects_pairwise_symmetry() {
        let mut novel = Novel::create("测试", "奇幻", "大陆");
        let ids: Vec<CharacterId> = (0..4)
            .map(|i| novel.add_character(Character::create(format!("C{}", i), 20, "男", "")).id.clone())
            .collect();
        let mut event = Event::create("灾难", "城市被毁");
        event.effects.push(EventEffect::character_relation(-0.4));
        event.effects.push(EventEffect {
            target: EffectTarget::Other("morale".to_string()),
            value: 1.0,
        });

        let engine = EventEngine::new(Arc::new(FixedRandom::new(vec![], 0)));
        assert_eq!(engine.apply_event_effects(&event, &mut novel, &ids), 4 * 3);

        for from in &ids {
            let character = novel.character(from).unwrap();
            assert_eq!(character.relationships.len(), 3);
            for rel in character.relationships.values() {
                assert!((rel.strength() + 0.4).abs() < 1e-9);
                assert_eq!(rel.history().len(), 1);
            }
        }
    }

    #[test]
    fn test_apply_effects_ignores_repeated_characters() {
        let mut novel = Novel::create("测试", "奇幻", "大陆");
        let a = novel.add_character(Character::create("A", 20, "男", "")).id.clone();
        let b = novel.add_character(Character::create("B", 22, "女", "")).id.clone();
        let mut event = Event::create("重逢", "旧友重逢");
        event.effects.push(EventEffect::character_relation(0.2));

        let engine = EventEngine::new(Arc::new(FixedRandom::new(vec![], 0)));
        let updates = engine.apply_event_effects(&event, &mut novel, &[a.clone(), b.clone(), a.clone()]);
        assert_eq!(updates, 2);

        let rel = novel.character(&a).unwrap().relationship(&b).unwrap();
        assert!((rel.strength() - 0.2).abs() < 1e-9);
        assert_eq!(rel.history().len(), 1);
        assert!(novel.character(&a).unwrap().relationship(&a).is_none());
        assert_eq!(novel.character(&b).unwrap().relationships.len(), 1);
    }

    #[test]
    fn test_apply_effects_skips_missing_characters() {
        let mut novel = Novel::create("测试", "奇幻", "大陆");
        let a = novel.add_character(Character::create("A", 20, "男", "")).id.clone();
        let mut event = Event::create("误会", "");
        event.effects.push(EventEffect::character_relation(0.5));

        let engine = EventEngine::new(Arc::new(FixedRandom::new(vec![], 0)));
        let ghost = CharacterId::from("char_ghost");
        assert_eq!(engine.apply_event_effects(&event, &mut novel, &[a.clone(), ghost]), 0);
        assert!(novel.character(&a).unwrap().relationships.is_empty());
    }
}
