//! Novel XML Codec - 小说文档编解码
//!
//! 文档结构（根元素 `novel`）:
//! id, title, genre, setting, current_chapter, creation_date, last_modified,
//! context, outline?, characters, events_library, chapters, timeline
//!
//! 文本叶子原样写入与读取，空文本写为自闭合元素；数值按 Rust 的最短往返格式写出；
//! 时间戳使用 RFC 3339。

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::Writer;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::application::parsing::{parse_document, XmlElement};
use crate::application::ports::CodecError;
use crate::domain::{
    Chapter, ChapterId, Character, CharacterId, EffectTarget, Event, EventEffect, EventId,
    HistoryEntry, Novel, NovelContext, NovelId, NovelParts, Outline, OutlineArc, OutlineId,
    Relationship, TimelineEntry, Trait, TraitId,
};

// ============================================================================
// Encoding
// ============================================================================

/// 把小说编码为 XML 文档
pub fn encode_novel(novel: &Novel) -> Result<String, CodecError> {
    let mut doc = DocWriter::new();
    doc.event(XmlEvent::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    doc.start("novel", &[])?;

    doc.text("id", novel.id().as_str())?;
    doc.text("title", novel.title())?;
    doc.text("genre", novel.genre())?;
    doc.text("setting", novel.setting())?;
    doc.text("current_chapter", &novel.current_chapter().to_string())?;
    doc.text("creation_date", &format_timestamp(novel.created_at()))?;
    doc.text("last_modified", &format_timestamp(novel.last_modified()))?;

    encode_context(&mut doc, novel.context())?;
    if let Some(outline) = novel.outline() {
        encode_outline(&mut doc, outline)?;
    }

    doc.start("characters", &[])?;
    for character in novel.characters().values() {
        encode_character(&mut doc, character)?;
    }
    doc.end("characters")?;

    doc.start("events_library", &[])?;
    for event in novel.events_library().values() {
        encode_event(&mut doc, event)?;
    }
    doc.end("events_library")?;

    doc.start("chapters", &[])?;
    for chapter in novel.chapters() {
        encode_chapter(&mut doc, chapter)?;
    }
    doc.end("chapters")?;

    doc.start("timeline", &[])?;
    for entry in novel.timeline() {
        doc.start("event", &[])?;
        doc.text("chapter", &entry.chapter.to_string())?;
        doc.text("title", &entry.title)?;
        if let Some(summary) = &entry.summary {
            doc.text("summary", summary)?;
        }
        doc.end("event")?;
    }
    doc.end("timeline")?;

    doc.end("novel")?;
    doc.finish()
}

fn encode_context(doc: &mut DocWriter, context: &NovelContext) -> Result<(), CodecError> {
    doc.start("context", &[])?;
    doc.text("global_context", &context.global_context)?;
    doc.start("chapter_contexts", &[])?;
    for (number, text) in &context.chapter_context {
        doc.text_with("chapter_context", &[("number", &number.to_string())], text)?;
    }
    doc.end("chapter_contexts")?;
    doc.end("context")
}

fn encode_outline(doc: &mut DocWriter, outline: &Outline) -> Result<(), CodecError> {
    doc.start("outline", &[])?;
    doc.text("id", outline.id.as_str())?;
    doc.text("overview", &outline.overview)?;
    doc.start("arcs", &[])?;
    for arc in &outline.arcs {
        doc.start("arc", &[])?;
        doc.text("name", &arc.name)?;
        doc.text("description", &arc.description)?;
        doc.list("key_events", "event", &arc.key_events)?;
        doc.end("arc")?;
    }
    doc.end("arcs")?;
    doc.end("outline")
}

fn encode_character(doc: &mut DocWriter, character: &Character) -> Result<(), CodecError> {
    doc.start("character", &[("id", character.id.as_str())])?;
    doc.text("name", &character.name)?;
    doc.text("age", &character.age.to_string())?;
    doc.text("gender", &character.gender)?;
    doc.text("background", &character.background)?;
    doc.text("appearance", &character.appearance)?;
    doc.text("notes", &character.notes)?;

    doc.start("personality", &[])?;
    for (name, value) in &character.personality {
        doc.text_with("trait", &[("name", name)], &value.to_string())?;
    }
    doc.end("personality")?;

    doc.start("traits", &[])?;
    for character_trait in &character.traits {
        doc.start("trait", &[("id", character_trait.id.as_str())])?;
        doc.text("name", &character_trait.name)?;
        doc.text("description", &character_trait.description)?;
        doc.start("impact", &[])?;
        for (attribute, value) in &character_trait.impact {
            doc.text_with("attribute", &[("name", attribute)], &value.to_string())?;
        }
        doc.end("impact")?;
        doc.end("trait")?;
    }
    doc.end("traits")?;

    doc.start("relationships", &[])?;
    for relationship in character.relationships.values() {
        doc.start("relationship", &[("target_id", relationship.target_id().as_str())])?;
        doc.text("type", relationship.relationship_type())?;
        doc.text("strength", &relationship.strength().to_string())?;
        doc.start("history", &[])?;
        for entry in relationship.history() {
            let timestamp = format_timestamp(entry.timestamp);
            doc.text_with("entry", &[("timestamp", &timestamp)], &entry.description)?;
        }
        doc.end("history")?;
        doc.end("relationship")?;
    }
    doc.end("relationships")?;

    doc.start("status", &[])?;
    for (key, value) in &character.status {
        doc.text_with("entry", &[("key", key)], value)?;
    }
    doc.end("status")?;

    doc.list("goals", "goal", &character.goals)?;
    doc.list("story_arcs", "arc", &character.story_arcs)?;
    doc.end("character")
}

fn encode_event(doc: &mut DocWriter, event: &Event) -> Result<(), CodecError> {
    doc.start("event", &[("id", event.id.as_str())])?;
    doc.text("name", &event.name)?;
    doc.text("description", &event.description)?;
    doc.text("user_editable", bool_text(event.user_editable))?;
    doc.text("notes", &event.notes)?;

    doc.start("triggers", &[])?;
    for (trigger_type, value) in &event.triggers {
        doc.empty("trigger", &[("type", trigger_type), ("value", value)])?;
    }
    doc.end("triggers")?;

    doc.start("effects", &[])?;
    for effect in &event.effects {
        let value = effect.value.to_string();
        doc.empty("effect", &[("target", effect.target.as_str()), ("value", &value)])?;
    }
    doc.end("effects")?;

    doc.list("narrative_templates", "template", &event.narrative_templates)?;
    doc.end("event")
}

fn encode_chapter(doc: &mut DocWriter, chapter: &Chapter) -> Result<(), CodecError> {
    let number = chapter.number().to_string();
    doc.start("chapter", &[("id", chapter.id.as_str()), ("number", &number)])?;
    doc.text("title", &chapter.title)?;
    doc.text("user_edited", bool_text(chapter.user_edited))?;
    doc.text("notes", &chapter.notes)?;

    doc.start("events", &[])?;
    for event_id in &chapter.events {
        doc.text("event", event_id.as_str())?;
    }
    doc.end("events")?;

    doc.start("character_focus", &[])?;
    for character_id in &chapter.character_focus {
        doc.text("character", character_id.as_str())?;
    }
    doc.end("character_focus")?;

    if !chapter.content.is_empty() {
        doc.text("content", &chapter.content)?;
    }
    if !chapter.summary.is_empty() {
        doc.text("summary", &chapter.summary)?;
    }
    doc.end("chapter")
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// quick-xml Writer 的薄封装
struct DocWriter {
    writer: Writer<Vec<u8>>,
}

impl DocWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: XmlEvent<'_>) -> Result<(), CodecError> {
        self.writer
            .write_event(event)
            .map_err(|e| CodecError::Xml(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), CodecError> {
        let mut start = BytesStart::new(name);
        start.extend_attributes(attrs.iter().copied());
        self.event(XmlEvent::Start(start))
    }

    fn end(&mut self, name: &str) -> Result<(), CodecError> {
        self.event(XmlEvent::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), CodecError> {
        let mut start = BytesStart::new(name);
        start.extend_attributes(attrs.iter().copied());
        self.event(XmlEvent::Empty(start))
    }

    fn text(&mut self, name: &str, text: &str) -> Result<(), CodecError> {
        self.text_with(name, &[], text)
    }

    /// 文本叶子；空文本写为自闭合元素
    fn text_with(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> Result<(), CodecError> {
        if text.is_empty() {
            return self.empty(name, attrs);
        }
        self.start(name, attrs)?;
        self.event(XmlEvent::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn list(&mut self, container: &str, item: &str, values: &[String]) -> Result<(), CodecError> {
        self.start(container, &[])?;
        for value in values {
            self.text(item, value)?;
        }
        self.end(container)
    }

    fn finish(self) -> Result<String, CodecError> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| CodecError::Xml(e.to_string()))
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// 从 XML 文档解码小说
pub fn decode_novel(xml: &str) -> Result<Novel, CodecError> {
    let root = parse_document(xml).map_err(|e| CodecError::Xml(e.to_string()))?;
    if root.name != "novel" {
        return Err(CodecError::MissingElement("novel".to_string()));
    }

    let context = match root.child("context") {
        Some(element) => decode_context(element)?,
        None => NovelContext::default(),
    };
    let outline = root.child("outline").map(decode_outline).transpose()?;

    let characters = items(&root, "characters", "character")
        .map(decode_character)
        .collect::<Result<Vec<_>, _>>()?;
    let events = items(&root, "events_library", "event")
        .map(decode_event)
        .collect::<Result<Vec<_>, _>>()?;
    let chapters = items(&root, "chapters", "chapter")
        .map(decode_chapter)
        .collect::<Result<Vec<_>, _>>()?;
    let timeline = items(&root, "timeline", "event")
        .map(decode_timeline_entry)
        .collect::<Result<Vec<_>, _>>()?;

    let parts = NovelParts {
        id: NovelId::from(required_text(&root, "id")?),
        title: required_text(&root, "title")?.to_string(),
        genre: required_text(&root, "genre")?.to_string(),
        setting: required_text(&root, "setting")?.to_string(),
        characters,
        chapters,
        events,
        timeline,
        current_chapter: parse_number("current_chapter", required_text(&root, "current_chapter")?)?,
        outline,
        context,
        created_at: parse_timestamp("creation_date", required_text(&root, "creation_date")?)?,
        last_modified: parse_timestamp("last_modified", required_text(&root, "last_modified")?)?,
    };

    Ok(Novel::from_parts(parts)?)
}

fn decode_context(element: &XmlElement) -> Result<NovelContext, CodecError> {
    let mut chapter_context = BTreeMap::new();
    for entry in items(element, "chapter_contexts", "chapter_context") {
        let number = parse_number("chapter_context@number", required_attr(entry, "number")?)?;
        chapter_context.insert(number, entry.text().to_string());
    }
    Ok(NovelContext {
        global_context: optional_text(element, "global_context"),
        chapter_context,
    })
}

fn decode_outline(element: &XmlElement) -> Result<Outline, CodecError> {
    let mut arcs = Vec::new();
    for arc_elem in items(element, "arcs", "arc") {
        let mut arc = OutlineArc::new(
            required_text(arc_elem, "name")?,
            optional_text(arc_elem, "description"),
        );
        arc.key_events = texts(arc_elem, "key_events", "event");
        arcs.push(arc);
    }
    Ok(Outline {
        id: OutlineId::from(required_text(element, "id")?),
        overview: optional_text(element, "overview"),
        arcs,
    })
}

fn decode_character(element: &XmlElement) -> Result<Character, CodecError> {
    let mut character = Character::with_id(
        CharacterId::from(required_attr(element, "id")?),
        required_text(element, "name")?,
        parse_number("character.age", required_text(element, "age")?)?,
        optional_text(element, "gender"),
        optional_text(element, "background"),
    );
    character.appearance = optional_text(element, "appearance");
    character.notes = optional_text(element, "notes");

    for trait_elem in items(element, "personality", "trait") {
        let name = required_attr(trait_elem, "name")?;
        let value = parse_number(&format!("personality.{}", name), trait_elem.text())?;
        character.personality.insert(name.to_string(), value);
    }

    for trait_elem in items(element, "traits", "trait") {
        let mut impact = IndexMap::new();
        for attribute in items(trait_elem, "impact", "attribute") {
            let name = required_attr(attribute, "name")?;
            impact.insert(name.to_string(), parse_number("impact", attribute.text())?);
        }
        // 直接恢复，不能经由 add_trait 再次叠加影响
        character.traits.push(Trait {
            id: TraitId::from(required_attr(trait_elem, "id")?),
            name: required_text(trait_elem, "name")?.to_string(),
            description: optional_text(trait_elem, "description"),
            impact,
        });
    }

    for rel_elem in items(element, "relationships", "relationship") {
        let target_id = CharacterId::from(required_attr(rel_elem, "target_id")?);
        let mut history = Vec::new();
        for entry in items(rel_elem, "history", "entry") {
            history.push(HistoryEntry {
                timestamp: parse_timestamp("history@timestamp", required_attr(entry, "timestamp")?)?,
                description: entry.text().to_string(),
            });
        }
        let relationship = Relationship::restore(
            target_id.clone(),
            optional_text(rel_elem, "type"),
            parse_number("relationship.strength", required_text(rel_elem, "strength")?)?,
            history,
        );
        character.relationships.insert(target_id, relationship);
    }

    for entry in items(element, "status", "entry") {
        character
            .status
            .insert(required_attr(entry, "key")?.to_string(), entry.text().to_string());
    }

    character.goals = texts(element, "goals", "goal");
    character.story_arcs = texts(element, "story_arcs", "arc");
    Ok(character)
}

fn decode_event(element: &XmlElement) -> Result<Event, CodecError> {
    let mut event = Event::with_id(
        EventId::from(required_attr(element, "id")?),
        required_text(element, "name")?,
        optional_text(element, "description"),
    );
    if let Some(text) = element.child_text("user_editable") {
        event.user_editable = parse_bool("event.user_editable", text)?;
    }
    event.notes = optional_text(element, "notes");

    for trigger in items(element, "triggers", "trigger") {
        event.triggers.insert(
            required_attr(trigger, "type")?.to_string(),
            trigger.attr("value").unwrap_or_default().to_string(),
        );
    }
    for effect in items(element, "effects", "effect") {
        event.effects.push(EventEffect {
            target: EffectTarget::from(required_attr(effect, "target")?),
            value: parse_number("effect@value", required_attr(effect, "value")?)?,
        });
    }
    event.narrative_templates = texts(element, "narrative_templates", "template");
    Ok(event)
}

fn decode_chapter(element: &XmlElement) -> Result<Chapter, CodecError> {
    let mut chapter = Chapter::with_id(
        ChapterId::from(required_attr(element, "id")?),
        parse_number("chapter@number", required_attr(element, "number")?)?,
        optional_text(element, "title"),
    );
    if let Some(text) = element.child_text("user_edited") {
        chapter.user_edited = parse_bool("chapter.user_edited", text)?;
    }
    chapter.notes = optional_text(element, "notes");
    chapter.events = items(element, "events", "event")
        .map(|e| EventId::from(e.text()))
        .collect();
    chapter.character_focus = items(element, "character_focus", "character")
        .map(|e| CharacterId::from(e.text()))
        .collect();
    chapter.content = optional_text(element, "content");
    chapter.summary = optional_text(element, "summary");
    Ok(chapter)
}

fn decode_timeline_entry(element: &XmlElement) -> Result<TimelineEntry, CodecError> {
    Ok(TimelineEntry {
        chapter: parse_number("timeline.chapter", required_text(element, "chapter")?)?,
        title: optional_text(element, "title"),
        summary: element.child_text("summary").map(str::to_string),
    })
}

/// `<container><item/>...</container>` 中的所有 item；容器缺失时为空
fn items<'a>(
    element: &'a XmlElement,
    container: &'a str,
    item: &'a str,
) -> impl Iterator<Item = &'a XmlElement> {
    element
        .child(container)
        .into_iter()
        .flat_map(move |c| c.children_named(item))
}

fn texts(element: &XmlElement, container: &str, item: &str) -> Vec<String> {
    items(element, container, item)
        .map(|e| e.text().to_string())
        .collect()
}

fn required_text<'a>(element: &'a XmlElement, name: &str) -> Result<&'a str, CodecError> {
    element.child_text(name).ok_or_else(|| {
        CodecError::MissingElement(format!("{}/{}", element.name, name))
    })
}

fn optional_text(element: &XmlElement, name: &str) -> String {
    element.child_text(name).unwrap_or_default().to_string()
}

fn required_attr<'a>(element: &'a XmlElement, attribute: &str) -> Result<&'a str, CodecError> {
    element.attr(attribute).ok_or_else(|| CodecError::MissingAttribute {
        element: element.name.clone(),
        attribute: attribute.to_string(),
    })
}

fn parse_number<T: FromStr>(field: &str, text: &str) -> Result<T, CodecError> {
    text.trim().parse().map_err(|_| CodecError::InvalidValue {
        field: field.to_string(),
        value: text.to_string(),
    })
}

fn parse_bool(field: &str, text: &str) -> Result<bool, CodecError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CodecError::InvalidValue {
            field: field.to_string(),
            value: text.to_string(),
        }),
    }
}

fn parse_timestamp(field: &str, text: &str) -> Result<DateTime<Utc>, CodecError> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| CodecError::InvalidValue {
            field: field.to_string(),
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich_novel() -> Novel {
        let mut novel = Novel::create("剑影 <上卷>", "武侠", "江湖 & 朝堂");
        novel.context_mut().global_context = "乱世\n  群雄并起".to_string();
        novel.context_mut().set_chapter_context(2, "雨夜");

        let mut alice = Character::create("Alice", 20, "女", "出身于\"北方\"小镇");
        alice.appearance = "高挑".to_string();
        alice.personality.insert("勇气".to_string(), 0.1 + 0.2);
        alice.add_trait(Trait::create(
            "无畏",
            "从不退缩",
            IndexMap::from([("勇气".to_string(), 0.25), ("谨慎".to_string(), -0.5)]),
        ));
        alice.status.insert("位置".to_string(), "客栈".to_string());
        alice.goals = vec!["复仇".to_string(), String::new()];
        alice.story_arcs = vec!["开端".to_string()];
        let bob = Character::create("Bob", 25, "男", "");
        let bob_id = bob.id.clone();
        alice.update_relationship(&bob_id, "朋友", 0.3, "初识");
        alice.update_relationship(&bob_id, "挚友", 0.9, "共患难");
        let alice_id = novel.add_character(alice).id.clone();
        novel.add_character(bob);

        let mut event = Event::create("结盟", "两派结盟");
        event.triggers.insert("character_relation".to_string(), "Friend".to_string());
        event.effects.push(EventEffect::character_relation(-0.35));
        event.effects.push(EventEffect {
            target: EffectTarget::Other("morale".to_string()),
            value: 1e-7,
        });
        event.narrative_templates.push("{character_name} 举杯".to_string());
        event.user_editable = false;
        let event_id = novel.add_event(event).id.clone();

        let mut outline = Outline::create("复仇与救赎");
        let mut arc = OutlineArc::new("开端", "小镇被毁");
        arc.key_events = vec!["大火".to_string(), "出走".to_string()];
        outline.arcs.push(arc);
        outline.arcs.push(OutlineArc::new("结局", ""));
        novel.set_outline(outline);

        let mut first = Chapter::create(1, "风起");
        first.content = "  第一段。\n\n第二段 <b>加粗</b>  ".to_string();
        first.summary = "出发".to_string();
        first.events = vec![event_id];
        first.character_focus = vec![alice_id, bob_id];
        novel.push_chapter(first);

        let mut second = Chapter::create(2, "手写");
        second.user_edited = true;
        second.notes = "待修改".to_string();
        novel.push_chapter(second);

        novel
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let novel = rich_novel();
        let xml = encode_novel(&novel).unwrap();
        let decoded = decode_novel(&xml).unwrap();
        assert_eq!(decoded, novel);

        // 再次编码得到相同文档
        assert_eq!(encode_novel(&decoded).unwrap(), xml);
    }

    #[test]
    fn test_round_trip_keeps_relationship_history_and_traits() {
        let novel = rich_novel();
        let decoded = decode_novel(&encode_novel(&novel).unwrap()).unwrap();

        let alice = decoded.characters().values().find(|c| c.name == "Alice").unwrap();
        let relationship = alice.relationships.values().next().unwrap();
        assert_eq!(relationship.strength(), 1.0);
        assert_eq!(relationship.relationship_type(), "挚友");
        assert_eq!(relationship.history().len(), 2);
        // 特质影响不会在加载时重复叠加
        assert_eq!(alice.personality["谨慎"], -0.5);
        assert_eq!(alice.traits.len(), 1);
    }

    #[test]
    fn test_document_layout() {
        let xml = encode_novel(&rich_novel()).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<current_chapter>2</current_chapter>"));
        assert!(xml.contains("<chapter_context number=\"2\">雨夜</chapter_context>"));
        assert!(xml.contains("<trigger type=\"character_relation\" value=\"Friend\"/>"));
        assert!(xml.contains("<user_editable>false</user_editable>"));
        assert!(xml.contains("<entry key=\"位置\">客栈</entry>"));
        // 空正文与摘要不写出
        let start = xml.find("手写").unwrap();
        let end = xml.find("</chapters>").unwrap();
        let second = &xml[start..end];
        assert!(!second.contains("<content"));
        assert!(!second.contains("<summary"));
    }

    #[test]
    fn test_empty_novel_round_trip() {
        let novel = Novel::create("空", "", "");
        let decoded = decode_novel(&encode_novel(&novel).unwrap()).unwrap();
        assert_eq!(decoded, novel);
        assert!(decoded.outline().is_none());
    }

    #[test]
    fn test_reject_malformed_documents() {
        assert!(matches!(decode_novel("<novel><id>x</id>"), Err(CodecError::Xml(_))));
        assert!(matches!(decode_novel("<book/>"), Err(CodecError::MissingElement(_))));
        assert!(matches!(
            decode_novel("<novel><id>x</id></novel>"),
            Err(CodecError::MissingElement(_))
        ));
    }

    #[test]
    fn test_reject_invalid_values_and_gaps() {
        let xml = encode_novel(&rich_novel()).unwrap();

        let bad_age = xml.replace("<age>20</age>", "<age>twenty</age>");
        assert!(matches!(
            decode_novel(&bad_age),
            Err(CodecError::InvalidValue { .. })
        ));

        let gap = xml.replace("number=\"2\">", "number=\"3\">");
        assert!(matches!(decode_novel(&gap), Err(CodecError::Invariant(_))));
    }

    #[test]
    fn test_current_chapter_reconciled_on_load() {
        let xml = encode_novel(&rich_novel())
            .unwrap()
            .replace("<current_chapter>2</current_chapter>", "<current_chapter>5</current_chapter>");
        let decoded = decode_novel(&xml).unwrap();
        assert_eq!(decoded.current_chapter(), 2);
    }
}
