//! Oracle Adapters - 文本生成服务实现

mod http_oracle_client;
mod resilient_oracle;
mod scripted_oracle;

pub use http_oracle_client::{HttpOracleClient, HttpOracleClientConfig, DEFAULT_SYSTEM_PROMPT};
pub use resilient_oracle::{ResilientOracle, RetryConfig};
pub use scripted_oracle::ScriptedOracle;
