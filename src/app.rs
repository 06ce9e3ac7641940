use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use telecron_core::config::AppConfig;
use telecron_dispatcher::{Dispatcher, TcpDelivery};
use telecron_server::Server;
use telecron_storage::{CoordinatorState, TaskStore};
use tokio::sync::broadcast;
use tracing::{error, info};

/// 应用运行模式
#[derive(Debug, Clone)]
pub enum AppMode {
    /// 仅运行协议服务端
    Server,
    /// 仅运行派发循环
    Dispatcher,
    /// 运行所有组件
    All,
}

/// 主应用程序
///
/// 服务端和派发循环共享同一份协调器状态: 注册表的更新对派发循环
/// 立即可见，任务文件则每轮从磁盘重载。
#[derive(Clone)]
pub struct Application {
    config: AppConfig,
    mode: AppMode,
    state: CoordinatorState,
}

impl Application {
    /// 创建新的应用实例
    pub async fn new(config: AppConfig, mode: AppMode) -> Result<Self> {
        info!("初始化应用程序，模式: {:?}", mode);

        let store = TaskStore::open(&config.storage.tasks_file).await;
        info!(
            "任务文件: {}，已加载 {} 个任务",
            config.storage.tasks_file,
            store.len()
        );

        let state = CoordinatorState::new(store);

        Ok(Self {
            config,
            mode,
            state,
        })
    }

    /// 运行应用程序
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动应用程序，模式: {:?}", self.mode);

        match self.mode {
            AppMode::Server => {
                self.run_server(shutdown_rx).await?;
            }
            AppMode::Dispatcher => {
                self.run_dispatcher(shutdown_rx).await?;
            }
            AppMode::All => {
                self.run_all_components(shutdown_rx).await?;
            }
        }

        Ok(())
    }

    /// 运行协议服务端
    async fn run_server(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动协议服务端: {}", self.config.server.bind_address);

        let server = Server::bind(
            &self.config.server.bind_address,
            self.state.clone(),
            Duration::from_secs(self.config.server.read_timeout_seconds),
        )
        .await
        .with_context(|| format!("绑定监听地址失败: {}", self.config.server.bind_address))?;

        server.run(shutdown_rx).await;

        info!("协议服务端已停止");
        Ok(())
    }

    /// 运行派发循环
    async fn run_dispatcher(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!(
            "启动派发循环，间隔 {} 秒",
            self.config.dispatcher.cycle_interval_seconds
        );

        let delivery = Arc::new(TcpDelivery::new(
            Duration::from_secs(self.config.dispatcher.connect_timeout_seconds),
            Duration::from_secs(self.config.dispatcher.write_timeout_seconds),
        ));

        let dispatcher = Dispatcher::new(
            self.state.clone(),
            delivery,
            Duration::from_secs(self.config.dispatcher.cycle_interval_seconds),
        );

        dispatcher.run(shutdown_rx).await;

        info!("派发循环已停止");
        Ok(())
    }

    /// 运行所有组件
    async fn run_all_components(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动所有组件");

        let mut handles = Vec::new();

        // 启动协议服务端（如果启用）
        if self.config.server.enabled {
            let app = self.clone_for_mode(AppMode::Server);
            let shutdown_rx = shutdown_rx.resubscribe();

            handles.push(tokio::spawn(async move {
                if let Err(e) = app.run_server(shutdown_rx).await {
                    error!("协议服务端运行失败: {}", e);
                }
            }));
        }

        // 启动派发循环（如果启用）
        if self.config.dispatcher.enabled {
            let app = self.clone_for_mode(AppMode::Dispatcher);
            let shutdown_rx = shutdown_rx.resubscribe();

            handles.push(tokio::spawn(async move {
                if let Err(e) = app.run_dispatcher(shutdown_rx).await {
                    error!("派发循环运行失败: {}", e);
                }
            }));
        }

        // 等待所有组件完成
        for handle in handles {
            let _ = handle.await;
        }

        info!("所有组件已停止");
        Ok(())
    }

    /// 为特定模式克隆应用实例
    fn clone_for_mode(&self, mode: AppMode) -> Self {
        Self {
            config: self.config.clone(),
            mode,
            state: self.state.clone(),
        }
    }
}
