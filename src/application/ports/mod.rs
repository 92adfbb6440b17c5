//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod novel_store;
mod oracle;
mod random;

pub use novel_store::{CodecError, NovelStorePort, SavedNovelInfo, StoreError};
pub use oracle::{OracleError, OraclePort, OracleRequest};
pub use random::RandomPort;
