//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod oracle;
pub mod random;

pub use oracle::*;
pub use random::*;
