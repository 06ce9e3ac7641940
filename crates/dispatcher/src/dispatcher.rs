//! 派发循环
//!
//! 固定间隔唤醒: 重载任务文件 → 用同一个时间戳逐个匹配 → 解析属主端点 →
//! 逐个推送。推送阶段不持有任何锁；单个任务失败只告警并继续，不重试。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use telecron_core::models::Task;
use telecron_storage::CoordinatorState;

use crate::delivery::CommandDelivery;

/// 单次派发循环的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// 命中调度表达式的任务数
    pub matched: usize,
    /// 成功推送的任务数
    pub delivered: usize,
    /// 属主未注册或推送失败而跳过的任务数
    pub skipped: usize,
}

pub struct Dispatcher {
    state: CoordinatorState,
    delivery: Arc<dyn CommandDelivery>,
    cycle_interval: Duration,
}

impl Dispatcher {
    pub fn new(
        state: CoordinatorState,
        delivery: Arc<dyn CommandDelivery>,
        cycle_interval: Duration,
    ) -> Self {
        Self {
            state,
            delivery,
            cycle_interval,
        }
    }

    /// 以固定间隔运行派发循环，直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.cycle_interval);
        // 慢循环只顺延下一次唤醒，不补发错过的tick
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!("派发循环启动，间隔 {} 秒", self.cycle_interval.as_secs());

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let stats = self.run_cycle(Local::now()).await;
                    if stats.matched > 0 {
                        info!(
                            "本轮派发完成: 命中 {} 个，推送成功 {} 个，跳过 {} 个",
                            stats.matched, stats.delivered, stats.skipped
                        );
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("派发循环收到关闭信号");
                    break;
                }
            }
        }
    }

    /// 执行一次派发检查
    ///
    /// 整轮用同一个时间戳判定命中。持任务锁期间只做文件重载和内存匹配，
    /// 持注册表读锁期间只做端点解析，推送时两把锁都已释放。
    pub async fn run_cycle(&self, now: DateTime<Local>) -> CycleStats {
        debug!("开始派发检查: {}", now.format("%Y-%m-%d %H:%M"));

        let matched: Vec<Task> = {
            let mut store = self.state.tasks.lock().await;
            store.load().await;
            store
                .tasks()
                .iter()
                .filter(|task| task.schedule.matches(&now))
                .cloned()
                .collect()
        };

        let mut stats = CycleStats {
            matched: matched.len(),
            ..CycleStats::default()
        };
        if matched.is_empty() {
            return stats;
        }

        let resolved: Vec<(Task, Option<SocketAddr>)> = {
            let clients = self.state.clients.read().await;
            matched
                .into_iter()
                .map(|task| {
                    let endpoint = clients.resolve(&task.username);
                    (task, endpoint)
                })
                .collect()
        };

        for (task, endpoint) in resolved {
            let endpoint = match endpoint {
                Some(endpoint) => endpoint,
                None => {
                    warn!("任务 {} 的属主 {} 未注册，跳过", task.id, task.username);
                    stats.skipped += 1;
                    continue;
                }
            };

            match self.delivery.deliver(endpoint, &task.command).await {
                Ok(()) => {
                    info!("任务 {} 已推送到 {} ({})", task.id, endpoint, task.username);
                    stats.delivered += 1;
                }
                Err(e) => {
                    warn!("任务 {} 推送失败，跳过: {}", task.id, e);
                    stats.skipped += 1;
                }
            }
        }

        stats
    }
}
