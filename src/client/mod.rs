// src/client/mod.rs

/// 声明客户端库的公共模块。
pub mod address;
pub mod args;
pub mod cache;
pub mod config;
pub mod dict;
pub mod endpoint;
pub mod lines;
pub mod output;
pub mod platform;
pub mod query;
pub mod transport;

// re-export 关键类型，方便外部使用
pub use args::CliArgs;
pub use cache::AddressCache;
pub use config::{ClientConfig, SharedConfig};
pub use dict::ResponseDict;
pub use output::{print_error, print_outcome, QueryOutcome};
pub use query::{QueryClient, QueryContext, QueryState};
pub use transport::{HttpPostFactory, Transport, TransportFactory, TransportTarget};
