//! Event Context - 事件限界上下文

mod entities;

pub use entities::{EffectTarget, Event, EventEffect};

entity_id!(
    /// 事件唯一标识
    EventId,
    "event"
);
