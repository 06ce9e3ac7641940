//! 命令处理
//!
//! 把解析后的请求作用到共享状态上，并产出发回客户端的应答文本。
//! 应答措辞与磁盘格式一样属于对外契约，固定为英文。

use std::net::IpAddr;

use tracing::{info, warn};

use telecron_core::models::Task;
use telecron_core::CoordinatorError;
use telecron_storage::CoordinatorState;

use crate::protocol::Request;

/// 协议命令处理器，每个连接克隆一份
#[derive(Clone)]
pub struct CommandHandler {
    state: CoordinatorState,
}

impl CommandHandler {
    pub fn new(state: CoordinatorState) -> Self {
        Self { state }
    }

    /// 处理一行请求，总是返回一段应答文本（LIST可能多行）
    pub async fn handle_line(&self, line: &str, peer_ip: IpAddr) -> String {
        match Request::parse(line) {
            Ok(request) => self.execute(request, peer_ip).await,
            Err(e) => error_reply(&e),
        }
    }

    async fn execute(&self, request: Request, peer_ip: IpAddr) -> String {
        match request {
            Request::Ping => "PONG".to_string(),

            Request::Register { username, port } => {
                let endpoint = self
                    .state
                    .clients
                    .write()
                    .await
                    .register(username.clone(), peer_ip, port);
                info!("客户端注册: {} -> {}", username, endpoint);
                format!("ACK: Registered {} at {}", username, endpoint)
            }

            Request::Add {
                username,
                schedule,
                command,
            } => {
                let mut tasks = self.state.tasks.lock().await;
                match tasks.append(username.clone(), schedule.clone(), command).await {
                    Ok(id) => {
                        info!("任务 {} 已登记: 用户 {}，调度 '{}'", id, username, schedule);
                        format!("ACK: Task {} added with schedule '{}'", id, schedule)
                    }
                    Err(e) => {
                        warn!("任务登记失败: {}", e);
                        error_reply(&e)
                    }
                }
            }

            Request::List { username } => {
                let mut tasks = self.state.tasks.lock().await;
                // 先重载，LIST要能看到其它协调器实例写入的任务
                tasks.load().await;
                render_listing(&tasks.list_for(&username))
            }

            Request::Remove { id } => {
                let mut tasks = self.state.tasks.lock().await;
                match tasks.remove(id).await {
                    Ok(()) => {
                        info!("任务 {} 已删除", id);
                        format!("ACK: Task {} removed", id)
                    }
                    Err(e) => error_reply(&e),
                }
            }

            Request::Clear => {
                self.state.tasks.lock().await.clear().await;
                info!("全部任务已清空");
                "All tasks cleared.".to_string()
            }

            Request::Status => {
                let count = self.state.tasks.lock().await.len();
                format!("STATUS: {} tasks loaded.", count)
            }

            Request::Save => match self.state.tasks.lock().await.save().await {
                Ok(()) => "Tasks saved.".to_string(),
                Err(e) => {
                    warn!("手动保存失败: {}", e);
                    "ERR: Failed to save tasks".to_string()
                }
            },

            Request::Load => {
                let count = self.state.tasks.lock().await.load().await;
                info!("手动重载完成，共 {} 个任务", count);
                "Tasks loaded.".to_string()
            }
        }
    }
}

/// 把错误转成发回客户端的ERR文本
fn error_reply(err: &CoordinatorError) -> String {
    match err {
        CoordinatorError::Protocol(message) => format!("ERR: {}", message),
        CoordinatorError::InvalidSchedule { reason, .. } => {
            format!("ERR: Invalid schedule: {}", reason)
        }
        CoordinatorError::InvalidCommand(reason) => format!("ERR: Invalid command: {}", reason),
        CoordinatorError::TaskNotFound { .. } => "ERR: Task ID not found".to_string(),
        _ => "ERR: Internal error".to_string(),
    }
}

/// 渲染LIST应答，零任务时只有表头
fn render_listing(tasks: &[Task]) -> String {
    let mut out = String::from("Scheduled Tasks:");
    for task in tasks {
        out.push_str(&format!(
            "\nTask {}: [{}] {}",
            task.id, task.schedule, task.command
        ));
    }
    out
}
