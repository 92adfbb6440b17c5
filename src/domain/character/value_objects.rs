//! Character Context - Value Objects

entity_id!(
    /// 角色唯一标识
    CharacterId,
    "char"
);

entity_id!(
    /// 特质唯一标识
    TraitId,
    "trait"
);
