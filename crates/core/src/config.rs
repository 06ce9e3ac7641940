//! 系统配置
//!
//! 配置加载顺序: 内置默认值 → TOML配置文件 → 环境变量覆盖（前缀: TELECRON_）。

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// 默认配置文件查找路径
const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/telecron.toml",
    "telecron.toml",
    "/etc/telecron/config.toml",
];

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dispatcher: DispatcherConfig,
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                enabled: true,
                bind_address: "0.0.0.0:5050".to_string(),
                read_timeout_seconds: 30,
            },
            dispatcher: DispatcherConfig {
                enabled: true,
                cycle_interval_seconds: 60,
                connect_timeout_seconds: 5,
                write_timeout_seconds: 5,
            },
            storage: StorageConfig {
                tasks_file: "tasks.json".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: TELECRON_)
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file path, if None use default paths
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder()
            .set_default("server.enabled", true)?
            .set_default("server.bind_address", "0.0.0.0:5050")?
            .set_default("server.read_timeout_seconds", 30)?
            .set_default("dispatcher.enabled", true)?
            .set_default("dispatcher.cycle_interval_seconds", 60)?
            .set_default("dispatcher.connect_timeout_seconds", 5)?
            .set_default("dispatcher.write_timeout_seconds", 5)?
            .set_default("storage.tasks_file", "tasks.json")?;

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            // 依次探测默认路径，取第一个存在的
            for path in &DEFAULT_CONFIG_PATHS {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        // 环境变量覆盖，优先级最高
        builder = builder.add_source(
            Environment::with_prefix("TELECRON")
                .separator("_")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        self.server.validate().context("服务端配置验证失败")?;

        self.dispatcher.validate().context("派发器配置验证失败")?;

        self.storage.validate().context("存储配置验证失败")?;

        if !self.server.enabled && !self.dispatcher.enabled {
            return Err(anyhow::anyhow!("服务端与派发器至少要启用一个"));
        }

        Ok(())
    }
}

/// 协议监听配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub read_timeout_seconds: u64,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("监听地址不能为空"));
        }

        self.bind_address
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("监听地址格式无效: {} - {}", self.bind_address, e))?;

        if self.read_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("读超时必须大于0"));
        }

        Ok(())
    }
}

/// 派发循环配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    pub enabled: bool,
    pub cycle_interval_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub write_timeout_seconds: u64,
}

impl DispatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cycle_interval_seconds == 0 {
            return Err(anyhow::anyhow!("派发间隔必须大于0"));
        }

        if self.connect_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("连接超时必须大于0"));
        }

        if self.write_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("写超时必须大于0"));
        }

        Ok(())
    }
}

/// 任务持久化配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub tasks_file: String,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tasks_file.is_empty() {
            return Err(anyhow::anyhow!("任务文件路径不能为空"));
        }

        Ok(())
    }
}
