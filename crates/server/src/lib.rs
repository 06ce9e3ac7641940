//! 协议服务端
//!
//! 按行文本协议的TCP监听、请求解析与命令处理。

pub mod handler;
pub mod listener;
pub mod protocol;

pub use handler::CommandHandler;
pub use listener::Server;
pub use protocol::Request;
