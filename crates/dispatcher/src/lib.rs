//! 派发组件
//!
//! 周期性地把到点任务的命令推送到已注册客户端。

pub mod delivery;
pub mod dispatcher;

pub use delivery::{CommandDelivery, TcpDelivery};
pub use dispatcher::{CycleStats, Dispatcher};
