//! 命令投递
//!
//! 派发循环通过[`CommandDelivery`]把命令文本推送到客户端端点。
//! 真实实现是[`TcpDelivery`]: 新建连接、写入原始字节、关闭写端即完成，
//! 不读取任何应答。

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use telecron_core::{CoordinatorError, CoordinatorResult};

/// 向客户端推送命令的出站通道
#[async_trait]
pub trait CommandDelivery: Send + Sync {
    /// 把命令文本原样推送到端点，不附加换行或任何封包
    async fn deliver(&self, endpoint: SocketAddr, command: &str) -> CoordinatorResult<()>;
}

/// 基于TCP的投递实现，连接与写入各有独立超时
#[derive(Debug, Clone)]
pub struct TcpDelivery {
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl TcpDelivery {
    pub fn new(connect_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            write_timeout,
        }
    }
}

#[async_trait]
impl CommandDelivery for TcpDelivery {
    async fn deliver(&self, endpoint: SocketAddr, command: &str) -> CoordinatorResult<()> {
        let mut stream = timeout(self.connect_timeout, TcpStream::connect(endpoint))
            .await
            .map_err(|_| CoordinatorError::Dispatch(format!("连接 {} 超时", endpoint)))?
            .map_err(|e| CoordinatorError::Dispatch(format!("连接 {} 失败: {}", endpoint, e)))?;

        let written = timeout(self.write_timeout, async {
            stream.write_all(command.as_bytes()).await?;
            stream.flush().await?;
            stream.shutdown().await
        })
        .await;

        match written {
            Err(_) => Err(CoordinatorError::Dispatch(format!(
                "向 {} 写入超时",
                endpoint
            ))),
            Ok(Err(e)) => Err(CoordinatorError::Dispatch(format!(
                "向 {} 写入失败: {}",
                endpoint, e
            ))),
            Ok(Ok(())) => {
                debug!("已向 {} 推送命令", endpoint);
                Ok(())
            }
        }
    }
}
