pub mod config;
pub mod errors;
pub mod limits;
pub mod models;

pub use config::{AppConfig, DispatcherConfig, ServerConfig, StorageConfig};
pub use errors::CoordinatorError;
pub use models::{ClientEndpoint, CronSchedule, Task};

/// 统一的Result类型
pub type CoordinatorResult<T> = std::result::Result<T, CoordinatorError>;
