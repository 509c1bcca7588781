//! OGS（online-go.com）客户端
//!
//! REST 接口、实时连接与对局会话，命令行入口见 `main.rs`。

pub mod config;
pub mod network;
pub mod rest;
pub mod session;

pub use config::ClientConfig;
pub use network::{NetworkConnection, RealtimeClient};
pub use rest::{ReqwestTransport, RestClient};
pub use session::GameSession;
