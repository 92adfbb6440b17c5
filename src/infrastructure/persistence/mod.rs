//! Persistence Layer - 数据持久化
//!
//! XML 文件存储实现

pub mod xml;

pub use self::xml::XmlFileNovelStore;
