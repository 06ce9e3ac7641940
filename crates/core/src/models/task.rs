//! 任务实体

use serde::{Deserialize, Serialize};

use crate::models::schedule::CronSchedule;

/// 一条已登记的定时任务
///
/// 持久化为JSON对象，字段名固定:
/// `{"id": 1, "username": "alice", "schedule": "0 9 * * 1", "command": "echo hi"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// 单调递增、永不复用的任务ID
    pub id: u64,
    /// 任务属主，派发时据此解析客户端地址
    pub username: String,
    /// 调度表达式
    pub schedule: CronSchedule,
    /// 派发给客户端执行的原始命令文本
    pub command: String,
}

impl Task {
    pub fn new(
        id: u64,
        username: impl Into<String>,
        schedule: CronSchedule,
        command: impl Into<String>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            schedule,
            command: command.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_fixed_field_names() {
        let task = Task::new(
            7,
            "alice",
            CronSchedule::parse("0 9 * * 1").unwrap(),
            "echo hi",
        );
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "username": "alice",
                "schedule": "0 9 * * 1",
                "command": "echo hi"
            })
        );
    }

    #[test]
    fn deserializes_tasks_with_invalid_schedules() {
        // 磁盘上的脏数据要能加载，只是永远不会命中
        let task: Task = serde_json::from_str(
            r#"{"id": 3, "username": "bob", "schedule": "every day", "command": "ls"}"#,
        )
        .unwrap();
        assert_eq!(task.id, 3);
        assert_eq!(task.schedule.as_str(), "every day");
    }
}
