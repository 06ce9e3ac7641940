//! 核心数据模型
//!
//! 任务、调度表达式与客户端端点。所有需要持久化的模型都实现了serde序列化。

pub mod client;
pub mod schedule;
pub mod task;

pub use client::*;
pub use schedule::*;
pub use task::*;
