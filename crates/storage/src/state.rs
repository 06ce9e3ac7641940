//! 协调器共享状态

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::registry::ClientRegistry;
use crate::task_store::TaskStore;

/// 服务端与派发器共享的运行时状态
///
/// 任务存储与注册表各有独立的锁，同一时刻最多持有其中一把；
/// 持锁期间不做任何网络IO。
#[derive(Debug, Clone)]
pub struct CoordinatorState {
    pub tasks: Arc<Mutex<TaskStore>>,
    pub clients: Arc<RwLock<ClientRegistry>>,
}

impl CoordinatorState {
    pub fn new(store: TaskStore) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(store)),
            clients: Arc::new(RwLock::new(ClientRegistry::new())),
        }
    }
}
