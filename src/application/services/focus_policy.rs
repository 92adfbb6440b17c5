//! Focus Selection Policy - 章节焦点角色选择

use std::sync::Arc;

use crate::application::ports::RandomPort;
use crate::domain::{CharacterId, Novel};

/// 焦点角色选择策略
pub trait FocusSelectionPolicy: Send + Sync {
    /// 为下一章选择焦点角色（按选择顺序）
    fn select_focus(&self, novel: &Novel) -> Vec<CharacterId>;
}

/// 默认策略：均匀随机选择 2 至 3 个角色（角色不足时全选）
pub struct RandomFocusPolicy {
    random: Arc<dyn RandomPort>,
    min_focus: usize,
    max_focus: usize,
}

impl RandomFocusPolicy {
    pub fn new(random: Arc<dyn RandomPort>) -> Self {
        Self {
            random,
            min_focus: 2,
            max_focus: 3,
        }
    }
}

impl FocusSelectionPolicy for RandomFocusPolicy {
    fn select_focus(&self, novel: &Novel) -> Vec<CharacterId> {
        let characters = novel.characters();
        if characters.is_empty() {
            return Vec::new();
        }

        let wanted = self.random.random_range(self.min_focus, self.max_focus);
        let amount = wanted.min(characters.len());
        self.random
            .sample_indices(characters.len(), amount)
            .into_iter()
            .filter_map(|index| characters.get_index(index).map(|(id, _)| id.clone()))
            .collect()
    }
}
