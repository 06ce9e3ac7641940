//! 交互会话
//!
//! 先向协调器注册自己的命令接收端口，然后把标准输入的每一行原样
//! 转发给协调器并打印应答。每条请求用一个独立连接: 写入一行后关闭
//! 写端，读到EOF即拿到完整应答。

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::info;

use telecron_core::CoordinatorResult;

/// 单条应答的读取上限（字节）
const MAX_REPLY_LEN: u64 = 64 * 1024;

/// 发送一行请求并读回完整应答
pub async fn send_command(server: SocketAddr, line: &str) -> CoordinatorResult<String> {
    let mut stream = TcpStream::connect(server).await?;
    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.shutdown().await?;

    let mut reply = String::new();
    let mut bounded = stream.take(MAX_REPLY_LEN);
    bounded.read_to_string(&mut reply).await?;
    Ok(reply.trim_end().to_string())
}

/// 注册并进入交互循环
///
/// stdin读到EOF或输入exit时结束。注册失败直接返回错误，
/// 之后单条命令的失败只打印，不中断会话。
pub async fn run_session(
    server: SocketAddr,
    username: &str,
    listen_port: u16,
) -> CoordinatorResult<()> {
    let reply = send_command(server, &format!("REGISTER {} {}", username, listen_port)).await?;
    info!("已注册为 {}，命令接收端口 {}", username, listen_port);
    println!("{}", reply);
    println!("Connected to coordinator at {} (type 'exit' to quit)", server);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" {
            break;
        }

        match send_command(server, line).await {
            Ok(reply) => println!("{}", reply),
            Err(e) => eprintln!("request failed: {}", e),
        }
    }

    info!("交互会话结束");
    Ok(())
}
