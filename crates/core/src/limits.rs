//! 输入长度上限
//!
//! 所有外部输入都经过可增长、带显式上限的缓冲区，超限即拒绝。

/// 单行协议请求的最大字节数（不含换行符）
pub const MAX_LINE_LEN: usize = 4096;

/// 命令文本的最大字节数
pub const MAX_COMMAND_LEN: usize = 1024;

/// 用户名的最大字节数
pub const MAX_USERNAME_LEN: usize = 64;

/// 调度表达式单个字段的最大字节数
pub const MAX_FIELD_LEN: usize = 16;
