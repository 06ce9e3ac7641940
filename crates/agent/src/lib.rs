//! 客户端代理
//!
//! 运行在任务属主的机器上: 监听协调器推送的命令并用shell执行，
//! 同时提供与协调器交互的命令会话。

pub mod executor;
pub mod listener;
pub mod session;

pub use executor::run_command;
pub use listener::TaskListener;
pub use session::{run_session, send_command};
