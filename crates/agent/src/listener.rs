//! 命令接收监听
//!
//! 接受协调器的推送连接，读完整个命令文本（对端关写即为结束），
//! 异步执行；接受循环绝不等待命令跑完。

use std::net::SocketAddr;

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use telecron_core::limits::MAX_COMMAND_LEN;
use telecron_core::CoordinatorResult;

use crate::executor;

/// 命令接收端
pub struct TaskListener {
    listener: TcpListener,
}

impl TaskListener {
    /// 绑定命令接收端口
    pub async fn bind(port: u16) -> CoordinatorResult<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        Ok(Self { listener })
    }

    /// 实际绑定到的地址
    pub fn local_addr(&self) -> CoordinatorResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// 运行接受循环，直到收到关闭信号
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        if let Ok(addr) = self.listener.local_addr() {
            info!("命令接收端监听 {}", addr);
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!("收到来自 {} 的推送连接", peer);
                            tokio::spawn(handle_push(stream, peer));
                        }
                        Err(e) => {
                            warn!("接受推送连接失败: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("命令接收端收到关闭信号");
                    break;
                }
            }
        }
    }
}

/// 读取一次推送的命令并执行
async fn handle_push(stream: TcpStream, peer: SocketAddr) {
    let mut command = String::new();
    let mut bounded = stream.take((MAX_COMMAND_LEN + 1) as u64);
    if let Err(e) = bounded.read_to_string(&mut command).await {
        warn!("读取 {} 的推送内容失败: {}", peer, e);
        return;
    }

    if command.len() > MAX_COMMAND_LEN {
        warn!("{} 推送的命令超过 {} 字节，丢弃", peer, MAX_COMMAND_LEN);
        return;
    }

    let command = command.trim();
    if command.is_empty() {
        warn!("{} 推送了空命令，忽略", peer);
        return;
    }

    if let Err(e) = executor::run_command(command).await {
        error!("命令执行失败: {}", e);
    }
}
