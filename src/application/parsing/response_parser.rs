//! 结构化响应解析器
//!
//! 把 Oracle 返回的半结构化文本（期望包含一个 `<character>` / `<events>` /
//! `<chapter>` / `<outline>` 块）映射为领域实体。只做结构提取和类型转换，
//! 不做语义校验。任何失败都返回 [`ResponseParseError`]，由调用方替换为占位实体。

use indexmap::IndexMap;
use thiserror::Error;

use super::xml_tree::{parse_document, XmlElement};
use crate::domain::{Character, EffectTarget, Event, EventEffect, Outline, OutlineArc};

/// 响应解析错误（诊断信息包含原始响应）
#[derive(Debug, Error)]
pub enum ResponseParseError {
    #[error("未找到 <{tag}> 结构块, 原始响应: {raw}")]
    BlockNotFound { tag: &'static str, raw: String },

    #[error("XML 解析失败: {reason}, 原始响应: {raw}")]
    Malformed { reason: String, raw: String },

    #[error("缺少必需字段 <{field}>, 原始响应: {raw}")]
    MissingField { field: String, raw: String },

    #[error("字段 {field} 的值无效: {value:?}, 原始响应: {raw}")]
    InvalidValue {
        field: String,
        value: String,
        raw: String,
    },
}

/// 解析出的章节内容（编号由章节管理器分配）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDraft {
    pub title: String,
    pub content: String,
    pub summary: String,
}

impl ChapterDraft {
    /// 解析失败时使用的占位章节内容
    pub fn placeholder(chapter_number: u32) -> Self {
        Self {
            title: format!("第{}章", chapter_number),
            content: "内容生成失败，请重试。".to_string(),
            summary: "章节解析错误。".to_string(),
        }
    }
}

/// 字段级失败，在出口处补上原始响应
enum Fault {
    Missing(String),
    Invalid { field: String, value: String },
}

impl Fault {
    fn with_raw(self, raw: &str) -> ResponseParseError {
        match self {
            Fault::Missing(field) => ResponseParseError::MissingField {
                field,
                raw: raw.to_string(),
            },
            Fault::Invalid { field, value } => ResponseParseError::InvalidValue {
                field,
                value,
                raw: raw.to_string(),
            },
        }
    }
}

/// 从响应中截取第一个 `<tag ...>` 到最后一个 `</tag>` 之间的块
pub fn extract_block<'a>(raw: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut search_from = 0;
    let start = loop {
        let offset = raw[search_from..].find(&open)?;
        let candidate = search_from + offset;
        let next = raw[candidate + open.len()..].chars().next();
        // 排除 `<events` 匹配 `<event` 这类前缀
        if matches!(next, Some('>') | Some('/')) || next.is_some_and(char::is_whitespace) {
            break candidate;
        }
        search_from = candidate + open.len();
    };

    let end = raw.rfind(&close)?;
    if end < start {
        return None;
    }
    Some(&raw[start..end + close.len()])
}

fn parse_block(raw: &str, tag: &'static str) -> Result<XmlElement, ResponseParseError> {
    let block = extract_block(raw, tag).ok_or_else(|| ResponseParseError::BlockNotFound {
        tag,
        raw: raw.to_string(),
    })?;
    parse_document(block).map_err(|err| ResponseParseError::Malformed {
        reason: err.to_string(),
        raw: raw.to_string(),
    })
}

fn required_text(element: &XmlElement, field: &str) -> Result<String, Fault> {
    element
        .child_text(field)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Fault::Missing(field.to_string()))
}

fn optional_text(element: &XmlElement, field: &str) -> Option<String> {
    element.child_text(field).map(|text| text.trim().to_string())
}

fn parse_f64(field: &str, text: &str) -> Result<f64, Fault> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| Fault::Invalid {
            field: field.to_string(),
            value: trimmed.to_string(),
        })
}

// ============================================================================
// Character
// ============================================================================

/// 解析 `<character>` 块
pub fn parse_character(raw: &str) -> Result<Character, ResponseParseError> {
    let root = parse_block(raw, "character")?;
    character_from_element(&root).map_err(|fault| fault.with_raw(raw))
}

fn character_from_element(root: &XmlElement) -> Result<Character, Fault> {
    let name = required_text(root, "name")?;
    let age_text = required_text(root, "age")?;
    let age = age_text.parse::<u32>().map_err(|_| Fault::Invalid {
        field: "age".to_string(),
        value: age_text.clone(),
    })?;
    let gender = required_text(root, "gender")?;
    let background = required_text(root, "background")?;

    let mut character = Character::create(name, age, gender, background);
    if let Some(appearance) = optional_text(root, "appearance") {
        character.appearance = appearance;
    }

    if let Some(personality) = root.child("personality") {
        for trait_elem in personality.children_named("trait") {
            let Some(trait_name) = trait_elem.attr("name") else {
                continue;
            };
            let value = parse_f64(&format!("personality.{}", trait_name), trait_elem.text())?;
            character.personality.insert(trait_name.to_string(), value);
        }
    }

    if let Some(goals) = root.child("goals") {
        character.goals.extend(
            goals
                .children_named("goal")
                .map(|goal| goal.text().trim().to_string())
                .filter(|goal| !goal.is_empty()),
        );
    }

    Ok(character)
}

// ============================================================================
// Events
// ============================================================================

/// 解析 `<events>` 块，返回其中的全部事件
pub fn parse_events(raw: &str) -> Result<Vec<Event>, ResponseParseError> {
    let root = parse_block(raw, "events")?;
    root.children_named("event")
        .map(event_from_element)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|fault| fault.with_raw(raw))
}

fn event_from_element(element: &XmlElement) -> Result<Event, Fault> {
    let name = required_text(element, "name")?;
    let description = required_text(element, "description")?;
    // 响应中的 <id> 被忽略，事件总是获得新 ID
    let mut event = Event::create(name, description);

    if let Some(triggers) = element.child("triggers") {
        let mut map = IndexMap::new();
        for trigger in triggers.children_named("trigger") {
            let Some(trigger_type) = trigger.attr("type") else {
                continue;
            };
            map.insert(
                trigger_type.to_string(),
                trigger.attr("value").unwrap_or_default().to_string(),
            );
        }
        event.triggers = map;
    }

    if let Some(effects) = element.child("effects") {
        for effect in effects.children_named("effect") {
            let target = effect.attr("target").ok_or_else(|| Fault::Missing("effect@target".into()))?;
            let value_text = effect.attr("value").ok_or_else(|| Fault::Missing("effect@value".into()))?;
            event.effects.push(EventEffect {
                target: EffectTarget::from(target),
                value: parse_f64("effect@value", value_text)?,
            });
        }
    }

    let direct = element.children_named("narrative_template");
    let nested = element
        .child("narrative_templates")
        .into_iter()
        .flat_map(|templates| templates.children_named("template"));
    event.narrative_templates = direct
        .chain(nested)
        .map(|template| template.text().trim().to_string())
        .filter(|template| !template.is_empty())
        .collect();

    Ok(event)
}

// ============================================================================
// Chapter
// ============================================================================

/// 解析 `<chapter>` 块
pub fn parse_chapter(raw: &str) -> Result<ChapterDraft, ResponseParseError> {
    let root = parse_block(raw, "chapter")?;
    chapter_from_element(&root).map_err(|fault| fault.with_raw(raw))
}

fn chapter_from_element(root: &XmlElement) -> Result<ChapterDraft, Fault> {
    Ok(ChapterDraft {
        title: required_text(root, "title")?,
        content: required_text(root, "content")?,
        summary: optional_text(root, "summary").unwrap_or_default(),
    })
}

// ============================================================================
// Outline
// ============================================================================

/// 解析 `<outline>` 块；情节弧可直接位于根下，也可包在 `<arcs>` 中
pub fn parse_outline(raw: &str) -> Result<Outline, ResponseParseError> {
    let root = parse_block(raw, "outline")?;
    outline_from_element(&root).map_err(|fault| fault.with_raw(raw))
}

fn outline_from_element(root: &XmlElement) -> Result<Outline, Fault> {
    let mut outline = Outline::create(required_text(root, "overview")?);

    let direct = root.children_named("arc");
    let nested = root
        .child("arcs")
        .into_iter()
        .flat_map(|arcs| arcs.children_named("arc"));
    for arc_elem in direct.chain(nested) {
        let mut arc = OutlineArc::new(
            required_text(arc_elem, "name")?,
            required_text(arc_elem, "description")?,
        );
        if let Some(key_events) = arc_elem.child("key_events") {
            arc.key_events = key_events
                .children_named("event")
                .map(|event| event.text().trim().to_string())
                .filter(|event| !event.is_empty())
                .collect();
        }
        outline.arcs.push(arc);
    }

    Ok(outline)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHARACTER_REPLY: &str = r#"好的，以下是角色：
```xml
<character>
    <name>林风</name>
    <age> 24 </age>
    <gender>男</gender>
    <background>边境小镇的铁匠之子</background>
    <personality>
        <trait name="勇气">0.8</trait>
        <trait name="智慧">0.55</trait>
    </personality>
    <goals>
        <goal>为父亲复仇</goal>
        <goal>守护小镇</goal>
    </goals>
</character>
```
希望你喜欢！"#;

    #[test]
    fn test_extract_block_ignores_commentary() {
        let block = extract_block("前言 <chapter><title>t</title></chapter> 后记", "chapter").unwrap();
        assert_eq!(block, "<chapter><title>t</title></chapter>");
    }

    #[test]
    fn test_extract_block_does_not_match_longer_tag() {
        let raw = "<events><event><name>a</name></event></events>";
        assert_eq!(extract_block(raw, "events"), Some(raw));
        assert_eq!(
            extract_block(raw, "event"),
            Some("<event><name>a</name></event>")
        );
        assert_eq!(extract_block("<eventsx></eventsx>", "events"), None);
    }

    #[test]
    fn test_parse_character_with_surrounding_text() {
        let character = parse_character(CHARACTER_REPLY).unwrap();
        assert_eq!(character.name, "林风");
        assert_eq!(character.age, 24);
        assert_eq!(character.appearance, "");
        assert_eq!(character.personality.len(), 2);
        assert!((character.personality["智慧"] - 0.55).abs() < 1e-9);
        assert_eq!(character.goals, vec!["为父亲复仇", "守护小镇"]);
    }

    #[test]
    fn test_parse_character_rejects_non_numeric_age() {
        let raw = "<character><name>A</name><age>二十</age><gender>男</gender><background>b</background></character>";
        let err = parse_character(raw).unwrap_err();
        assert!(matches!(err, ResponseParseError::InvalidValue { ref field, .. } if field == "age"));
        assert!(err.to_string().contains(raw));
    }

    #[test]
    fn test_parse_character_missing_required_field() {
        let raw = "<character><name>A</name><age>20</age><gender>男</gender></character>";
        assert!(matches!(
            parse_character(raw),
            Err(ResponseParseError::MissingField { ref field, .. }) if field == "background"
        ));
    }

    #[test]
    fn test_parse_character_skips_absent_optional_nodes() {
        let raw = "<character><name>A</name><age>20</age><gender>男</gender><background>b</background></character>";
        let character = parse_character(raw).unwrap();
        assert!(character.personality.is_empty());
        assert!(character.goals.is_empty());
    }

    #[test]
    fn test_parse_events() {
        let raw = r#"<events>
    <event>
        <id>event_1</id>
        <name>背叛</name>
        <description>盟友倒戈</description>
        <triggers><trigger type="character_relation" value="Friend"/></triggers>
        <effects>
            <effect target="character_relation" value="-0.3"/>
            <effect target="morale" value="0.1"/>
        </effects>
        <narrative_template>{character_name} 发现了真相</narrative_template>
    </event>
    <event>
        <name>重逢</name>
        <description>旧友重逢</description>
    </event>
</events>"#;
        let events = parse_events(raw).unwrap();
        assert_eq!(events.len(), 2);

        let betrayal = &events[0];
        assert_ne!(betrayal.id.as_str(), "event_1");
        assert_eq!(betrayal.triggers.get("character_relation").map(String::as_str), Some("Friend"));
        assert_eq!(betrayal.effects.len(), 2);
        assert_eq!(betrayal.effects[0], EventEffect::character_relation(-0.3));
        assert_eq!(betrayal.effects[1].target, EffectTarget::Other("morale".to_string()));
        assert_eq!(betrayal.narrative_templates, vec!["{character_name} 发现了真相"]);

        assert!(events[1].effects.is_empty());
        assert!(events[1].triggers.is_empty());
    }

    #[test]
    fn test_parse_events_bad_effect_value() {
        let raw = r#"<events><event><name>a</name><description>b</description>
            <effects><effect target="character_relation" value="lots"/></effects></event></events>"#;
        assert!(matches!(
            parse_events(raw),
            Err(ResponseParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_chapter() {
        let raw = "<chapter><title>风起</title><content>\n  正文……\n</content><summary> 摘要 </summary></chapter>";
        let draft = parse_chapter(raw).unwrap();
        assert_eq!(draft.title, "风起");
        assert_eq!(draft.content, "正文……");
        assert_eq!(draft.summary, "摘要");
    }

    #[test]
    fn test_parse_chapter_truncated() {
        let raw = "<chapter><title>风起</title><content>正文被截断";
        assert!(matches!(
            parse_chapter(raw),
            Err(ResponseParseError::BlockNotFound { .. })
        ));
        let raw = "<chapter><title>风起</title><content>正文</chapter>";
        assert!(matches!(
            parse_chapter(raw),
            Err(ResponseParseError::Malformed { .. })
        ));
    }

    #[test]
    fn test_parse_outline_accepts_both_arc_layouts() {
        let raw = r#"<outline>
    <overview>复仇与救赎</overview>
    <arc><name>开端</name><description>小镇被毁</description>
        <key_events><event>大火</event><event>出走</event></key_events></arc>
    <arcs><arc><name>结局</name><description>归来</description></arc></arcs>
</outline>"#;
        let outline = parse_outline(raw).unwrap();
        assert_eq!(outline.overview, "复仇与救赎");
        assert_eq!(outline.arcs.len(), 2);
        assert_eq!(outline.arcs[0].key_events, vec!["大火", "出走"]);
        assert_eq!(outline.arcs[1].name, "结局");
    }

    #[test]
    fn test_non_xml_input_fails_for_every_schema() {
        let raw = "抱歉，我无法完成这个请求。";
        assert!(parse_character(raw).is_err());
        assert!(parse_events(raw).is_err());
        assert!(parse_chapter(raw).is_err());
        assert!(parse_outline(raw).is_err());
    }
}
