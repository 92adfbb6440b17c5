//! 轻量 XML 元素树
//!
//! 基于 quick-xml 事件流构建，供结构化响应解析与持久化解码共用。
//! 叶子元素的文本原样保留（不裁剪首尾空白）。

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlTreeError {
    #[error("XML syntax error {0}")]
    Syntax(String),

    #[error("unclosed element <{0}>")]
    Unclosed(String),

    #[error("unexpected closing tag")]
    UnexpectedEnd,

    #[error("multiple root elements")]
    MultipleRoots,

    #[error("document has no root element")]
    Empty,
}

/// XML 元素
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// 直接子文本（含 CDATA），不含后代元素的文本
    pub text: String,
}

impl XmlElement {
    /// 第一个同名子元素
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// 所有同名子元素
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 子元素文本（原样）
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(XmlElement::text)
    }
}

/// 解析完整文档，返回根元素
pub fn parse_document(xml: &str) -> Result<XmlElement, XmlTreeError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(open_element(&e)?),
            Ok(Event::Empty(e)) => {
                let element = open_element(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or(XmlTreeError::UnexpectedEnd)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| XmlTreeError::Syntax(err.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(XmlTreeError::Syntax(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    err
                )))
            }
            // 声明、注释、处理指令、DOCTYPE
            Ok(_) => {}
        }
    }

    if let Some(unclosed) = stack.last() {
        return Err(XmlTreeError::Unclosed(unclosed.name.clone()));
    }
    root.ok_or(XmlTreeError::Empty)
}

fn open_element(start: &BytesStart<'_>) -> Result<XmlElement, XmlTreeError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| XmlTreeError::Syntax(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| XmlTreeError::Syntax(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlTreeError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(XmlTreeError::MultipleRoots),
    }
    Ok(())
}
