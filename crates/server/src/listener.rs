//! TCP监听
//!
//! 接受循环永不被单个连接阻塞；每个连接一个独立任务，panic就地捕获，
//! 行读取有长度上限与读超时。

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::{FutureExt, SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use telecron_core::limits::MAX_LINE_LEN;
use telecron_core::CoordinatorResult;
use telecron_storage::CoordinatorState;

use crate::handler::CommandHandler;

/// 协议服务端
pub struct Server {
    listener: TcpListener,
    handler: CommandHandler,
    read_timeout: Duration,
}

impl Server {
    /// 绑定监听地址
    ///
    /// 绑定失败是唯一致命的运行期错误，直接向上传播。
    pub async fn bind(
        bind_address: &str,
        state: CoordinatorState,
        read_timeout: Duration,
    ) -> CoordinatorResult<Self> {
        let listener = TcpListener::bind(bind_address).await?;
        Ok(Self {
            listener,
            handler: CommandHandler::new(state),
            read_timeout,
        })
    }

    /// 实际绑定到的地址
    pub fn local_addr(&self) -> CoordinatorResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// 运行接受循环，直到收到关闭信号
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        if let Ok(addr) = self.listener.local_addr() {
            info!("协议服务端监听 {}", addr);
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            debug!("接受连接: {}", peer);
                            let handler = self.handler.clone();
                            let read_timeout = self.read_timeout;
                            tokio::spawn(async move {
                                let handled =
                                    AssertUnwindSafe(handle_connection(handler, stream, peer, read_timeout))
                                        .catch_unwind()
                                        .await;
                                if handled.is_err() {
                                    error!("连接 {} 的处理任务发生panic", peer);
                                }
                            });
                        }
                        Err(e) => {
                            warn!("接受连接失败: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("协议服务端收到关闭信号");
                    break;
                }
            }
        }
    }
}

/// 处理一个连接上的全部请求行，按到达顺序逐行应答
///
/// 同一连接上的多条请求按管道方式依次处理；读超时、对端关闭或IO错误
/// 都只关闭这一个连接。
async fn handle_connection(
    handler: CommandHandler,
    stream: TcpStream,
    peer: SocketAddr,
    read_timeout: Duration,
) {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN));

    loop {
        let line = match timeout(read_timeout, framed.next()).await {
            Err(_) => {
                debug!("连接 {} 读超时，关闭", peer);
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded))) => {
                warn!("连接 {} 发来超长请求行", peer);
                if framed.send("ERR: Request line too long").await.is_err() {
                    break;
                }
                // 编解码器会丢弃剩余内容直到下一个换行符，连接继续可用
                continue;
            }
            Ok(Some(Err(LinesCodecError::Io(e)))) => {
                debug!("连接 {} 读取失败: {}", peer, e);
                break;
            }
            Ok(Some(Ok(line))) => line,
        };

        let reply = handler.handle_line(&line, peer.ip()).await;
        if let Err(e) = framed.send(reply).await {
            debug!("连接 {} 应答发送失败: {}", peer, e);
            break;
        }
    }

    debug!("连接 {} 关闭", peer);
}
