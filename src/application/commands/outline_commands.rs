//! Outline Commands

use crate::domain::{Outline, OutlineArc};

/// 大纲部分更新（arcs 整体替换）
#[derive(Debug, Clone, Default)]
pub struct OutlineUpdate {
    pub overview: Option<String>,
    pub arcs: Option<Vec<OutlineArc>>,
}

impl OutlineUpdate {
    pub fn apply_to(self, outline: &mut Outline) {
        if let Some(overview) = self.overview {
            outline.overview = overview;
        }
        if let Some(arcs) = self.arcs {
            outline.arcs = arcs;
        }
    }
}
