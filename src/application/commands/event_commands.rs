//! Event Commands

use indexmap::IndexMap;

use crate::domain::{Event, EventEffect};

/// 手动创建事件
#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub name: String,
    pub description: String,
}

/// 事件部分更新（集合字段整体替换）
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub triggers: Option<IndexMap<String, String>>,
    pub effects: Option<Vec<EventEffect>>,
    pub narrative_templates: Option<Vec<String>>,
    pub user_editable: Option<bool>,
    pub notes: Option<String>,
}

impl EventUpdate {
    pub fn apply_to(self, event: &mut Event) {
        if let Some(name) = self.name {
            event.name = name;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(triggers) = self.triggers {
            event.triggers = triggers;
        }
        if let Some(effects) = self.effects {
            event.effects = effects;
        }
        if let Some(templates) = self.narrative_templates {
            event.narrative_templates = templates;
        }
        if let Some(user_editable) = self.user_editable {
            event.user_editable = user_editable;
        }
        if let Some(notes) = self.notes {
            event.notes = notes;
        }
    }
}
