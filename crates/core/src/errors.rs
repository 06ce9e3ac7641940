use thiserror::Error;

/// 协调器错误类型定义
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("协议错误: {0}")]
    Protocol(String),

    #[error("无效的调度表达式 '{expr}': {reason}")]
    InvalidSchedule { expr: String, reason: String },

    #[error("无效的命令: {0}")]
    InvalidCommand(String),

    #[error("任务未找到: {id}")]
    TaskNotFound { id: u64 },

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("命令派发失败: {0}")]
    Dispatch(String),
}

/// 统一的Result类型
pub type Result<T> = std::result::Result<T, CoordinatorError>;
