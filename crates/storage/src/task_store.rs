//! 任务持久化存储
//!
//! 内存中的任务列表加一个JSON数组文件。变更先改内存再整体落盘；
//! 落盘失败只记录日志，下一次成功的保存会覆盖掉旧内容。

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use telecron_core::limits::MAX_COMMAND_LEN;
use telecron_core::models::{CronSchedule, Task};
use telecron_core::{CoordinatorError, CoordinatorResult};

/// 基于JSON文件的任务存储
///
/// 结构本身不加锁，调用方需用互斥锁串行化所有访问。
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskStore {
    /// 打开存储并完成首次加载
    ///
    /// 父目录不存在时先尝试创建，创建失败不阻止启动（后续保存会再报错）。
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent).await {
                    warn!("任务目录创建失败: {} - {}", parent.display(), e);
                }
            }
        }

        let mut store = Self {
            path,
            tasks: Vec::new(),
            next_id: 1,
        };
        store.load().await;
        store
    }

    /// 从磁盘重新加载任务列表，返回加载到的任务数
    ///
    /// 文件缺失、不可读或内容非法都按空列表处理，只记录日志。
    /// next_id在进程生命周期内单调不减，重载不会导致ID复用。
    pub async fn load(&mut self) -> usize {
        let tasks = match fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<Task>>(&bytes) {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!(
                        "任务文件解析失败，按空列表处理: {} - {}",
                        self.path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("任务文件不存在，按空列表处理: {}", self.path.display());
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "任务文件读取失败，按空列表处理: {} - {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        };

        let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
        self.tasks = tasks;
        self.tasks.len()
    }

    /// 全量落盘
    ///
    /// 先写同目录临时文件再原子改名，读端不会看到写了一半的文件。
    pub async fn save(&self) -> CoordinatorResult<()> {
        let json = serde_json::to_vec_pretty(&self.tasks)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, &json).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(CoordinatorError::Io(e));
        }
        Ok(())
    }

    /// 追加一条新任务并落盘，返回分配的任务ID
    ///
    /// 命令为空或超长时拒绝，不产生任何变更。ID从1开始严格递增，
    /// 删除后也不复用。
    pub async fn append(
        &mut self,
        username: impl Into<String>,
        schedule: CronSchedule,
        command: impl Into<String>,
    ) -> CoordinatorResult<u64> {
        let command = command.into();
        if command.is_empty() {
            return Err(CoordinatorError::InvalidCommand("empty command".to_string()));
        }
        if command.len() > MAX_COMMAND_LEN {
            return Err(CoordinatorError::InvalidCommand(format!(
                "command longer than {} bytes",
                MAX_COMMAND_LEN
            )));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Task::new(id, username, schedule, command));
        self.persist_after_change().await;
        Ok(id)
    }

    /// 按ID删除任务并落盘
    ///
    /// ID不存在时返回TaskNotFound，列表与文件都保持原样。
    pub async fn remove(&mut self, id: u64) -> CoordinatorResult<()> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(CoordinatorError::TaskNotFound { id })?;

        self.tasks.remove(index);
        self.persist_after_change().await;
        Ok(())
    }

    /// 清空全部任务并落盘，next_id不回退
    pub async fn clear(&mut self) {
        self.tasks.clear();
        self.persist_after_change().await;
    }

    /// 指定用户的任务快照，按登记顺序
    pub fn list_for(&self, username: &str) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.username == username)
            .cloned()
            .collect()
    }

    /// 当前内存中的全部任务
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// 当前内存中的任务数，不触发重载
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 变更后的落盘，失败只告警
    async fn persist_after_change(&self) {
        if let Err(e) = self.save().await {
            warn!("任务落盘失败，等待下次保存重试: {}", e);
        }
    }
}
