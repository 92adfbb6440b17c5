//! Novel Context - Value Objects

entity_id!(
    /// 小说唯一标识
    NovelId,
    "novel"
);

entity_id!(
    /// 章节唯一标识
    ChapterId,
    "chapter"
);

entity_id!(
    /// 大纲唯一标识
    OutlineId,
    "outline"
);
