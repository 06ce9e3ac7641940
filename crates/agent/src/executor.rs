//! 命令执行
//!
//! 推送来的命令文本交给 `sh -c` 执行，输出逐行转入日志；
//! 退出码只记录，不向协调器回报。

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

use telecron_core::CoordinatorResult;

/// 执行一条shell命令，返回退出码（被信号终止时为None）
pub async fn run_command(command: &str) -> CoordinatorResult<Option<i32>> {
    info!("开始执行命令: {}", command);

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_task = async {
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!("[stdout] {}", line);
            }
        }
    };
    let stderr_task = async {
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!("[stderr] {}", line);
            }
        }
    };

    let (status, _, _) = tokio::join!(child.wait(), stdout_task, stderr_task);
    let status = status?;

    match status.code() {
        Some(code) => info!("命令执行结束，退出码 {}", code),
        None => warn!("命令被信号终止"),
    }

    Ok(status.code())
}
