//! XML 文档存储

mod codec;
mod file_store;
mod text_export;

pub use codec::{decode_novel, encode_novel};
pub use file_store::XmlFileNovelStore;
pub use text_export::render_manuscript;
