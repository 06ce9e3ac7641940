use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use tracing::{error, info};

use telecron::common::{init_stderr_logging, wait_for_shutdown_signal};
use telecron::shutdown::ShutdownManager;
use telecron_agent::{run_session, TaskListener};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("telecron-agent")
        .version("1.0.0")
        .about("分布式定时任务协调系统 - 客户端代理")
        .arg(
            Arg::new("server")
                .short('s')
                .long("server")
                .value_name("ADDR")
                .help("协调器地址")
                .default_value("127.0.0.1:5050"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("命令接收端口")
                .value_parser(clap::value_parser!(u16))
                .default_value("6060"),
        )
        .arg(
            Arg::new("user")
                .short('u')
                .long("user")
                .value_name("NAME")
                .help("注册用的用户名")
                .required(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .default_value("info"),
        )
        .get_matches();

    let server_str = matches.get_one::<String>("server").unwrap();
    let port = *matches.get_one::<u16>("port").unwrap();
    let username = matches.get_one::<String>("user").unwrap().clone();
    let log_level = matches.get_one::<String>("log-level").unwrap();

    // 初始化日志系统（stdout留给协调器应答）
    init_stderr_logging(log_level)?;

    let server: SocketAddr = server_str
        .parse()
        .with_context(|| format!("协调器地址无效: {server_str}"))?;

    info!("启动客户端代理，用户 {username}，协调器 {server}");

    // 先绑定命令接收端口，注册时上报实际端口
    let listener = TaskListener::bind(port)
        .await
        .with_context(|| format!("绑定命令接收端口失败: {port}"))?;
    let listen_port = listener.local_addr()?.port();

    let shutdown_manager = ShutdownManager::new();
    let listener_handle = {
        let shutdown_rx = shutdown_manager.subscribe().await;
        tokio::spawn(listener.run(shutdown_rx))
    };

    // 交互会话结束或收到信号都退出
    tokio::select! {
        result = run_session(server, &username, listen_port) => {
            match result {
                Ok(()) => info!("交互会话已退出"),
                Err(e) => error!("交互会话失败: {e}"),
            }
        }
        _ = wait_for_shutdown_signal() => {}
    }

    // 停掉命令接收端
    shutdown_manager.shutdown().await;
    if tokio::time::timeout(Duration::from_secs(5), listener_handle)
        .await
        .is_err()
    {
        error!("命令接收端关闭超时");
    }

    info!("客户端代理已退出");
    Ok(())
}
