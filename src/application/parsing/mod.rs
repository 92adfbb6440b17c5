//! 结构化文本解析
//!
//! - `xml_tree`: 基于 quick-xml 的元素树，响应解析与文档解码共用
//! - `response_parser`: Oracle 响应到领域实体的映射

mod response_parser;
mod xml_tree;

pub use response_parser::{
    extract_block, parse_chapter, parse_character, parse_events, parse_outline, ChapterDraft,
    ResponseParseError,
};
pub use xml_tree::{parse_document, XmlElement, XmlTreeError};
