#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::sync::broadcast;

    use telecron_agent::send_command;
    use telecron_dispatcher::{Dispatcher, TcpDelivery};
    use telecron_server::Server;
    use telecron_storage::{CoordinatorState, TaskStore};

    /// 一套完整的协调器: 协议服务端和派发循环共享同一份状态
    struct TestCluster {
        addr: SocketAddr,
        shutdown_tx: broadcast::Sender<()>,
    }

    impl TestCluster {
        async fn start(tasks_path: impl Into<PathBuf>, cycle_interval: Duration) -> Self {
            let state = CoordinatorState::new(TaskStore::open(tasks_path).await);

            let server = Server::bind("127.0.0.1:0", state.clone(), Duration::from_secs(5))
                .await
                .unwrap();
            let addr = server.local_addr().unwrap();

            let (shutdown_tx, server_rx) = broadcast::channel(8);
            tokio::spawn(server.run(server_rx));

            let delivery = Arc::new(TcpDelivery::new(
                Duration::from_secs(1),
                Duration::from_secs(1),
            ));
            let dispatcher = Dispatcher::new(state, delivery, cycle_interval);
            let dispatcher_rx = shutdown_tx.subscribe();
            tokio::spawn(async move { dispatcher.run(dispatcher_rx).await });

            Self { addr, shutdown_tx }
        }

        async fn request(&self, line: &str) -> String {
            send_command(self.addr, line).await.unwrap()
        }

        async fn stop(&self) {
            let _ = self.shutdown_tx.send(());
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    fn tasks_path(dir: &TempDir) -> PathBuf {
        dir.path().join("tasks.json")
    }

    /// 从ADD应答中取出任务ID
    fn added_id(reply: &str) -> u64 {
        assert!(reply.starts_with("ACK: Task "), "unexpected reply: {reply}");
        reply.split_whitespace().nth(2).unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn full_task_lifecycle() {
        let dir = TempDir::new().unwrap();
        let cluster = TestCluster::start(tasks_path(&dir), Duration::from_secs(3600)).await;

        assert_eq!(cluster.request("PING").await, "PONG");

        let reply = cluster.request("REGISTER alice 7001").await;
        assert_eq!(reply, "ACK: Registered alice at 127.0.0.1:7001");

        let reply = cluster.request("ADD alice 0 9 * * 1 echo weekly").await;
        assert_eq!(reply, "ACK: Task 1 added with schedule '0 9 * * 1'");

        let reply = cluster.request("ADD alice 30 6 * * * echo daily").await;
        assert_eq!(reply, "ACK: Task 2 added with schedule '30 6 * * *'");

        let listing = cluster.request("LIST alice").await;
        assert_eq!(
            listing,
            "Scheduled Tasks:\nTask 1: [0 9 * * 1] echo weekly\nTask 2: [30 6 * * *] echo daily"
        );

        assert_eq!(cluster.request("STATUS").await, "STATUS: 2 tasks loaded.");

        assert_eq!(cluster.request("REMOVE 1").await, "ACK: Task 1 removed");
        assert_eq!(cluster.request("STATUS").await, "STATUS: 1 tasks loaded.");

        assert_eq!(cluster.request("CLEAR").await, "All tasks cleared.");
        assert_eq!(cluster.request("STATUS").await, "STATUS: 0 tasks loaded.");
    }

    #[tokio::test]
    async fn rejected_add_leaves_no_task_behind() {
        let dir = TempDir::new().unwrap();
        let cluster = TestCluster::start(tasks_path(&dir), Duration::from_secs(3600)).await;

        let reply = cluster.request("ADD alice 0 9 * * 8 echo never").await;
        assert!(reply.starts_with("ERR: Invalid schedule:"), "{reply}");

        // 范围语法不支持，同样在登记时拒绝
        let reply = cluster.request("ADD alice 1-5 * * * * echo never").await;
        assert!(reply.starts_with("ERR: Invalid schedule:"), "{reply}");

        assert_eq!(cluster.request("LIST alice").await, "Scheduled Tasks:");
        assert_eq!(cluster.request("STATUS").await, "STATUS: 0 tasks loaded.");
    }

    #[tokio::test]
    async fn concurrent_adds_receive_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let cluster =
            Arc::new(TestCluster::start(tasks_path(&dir), Duration::from_secs(3600)).await);

        let mut handles = Vec::new();
        for i in 0..10 {
            let cluster = Arc::clone(&cluster);
            handles.push(tokio::spawn(async move {
                let reply = cluster
                    .request(&format!("ADD alice * * * * * echo job-{i}"))
                    .await;
                added_id(&reply)
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }

        assert_eq!(ids.len(), 10);
        assert_eq!(cluster.request("STATUS").await, "STATUS: 10 tasks loaded.");
    }

    #[tokio::test]
    async fn tasks_survive_coordinator_restart() {
        let dir = TempDir::new().unwrap();
        let path = tasks_path(&dir);

        let cluster = TestCluster::start(&path, Duration::from_secs(3600)).await;
        cluster.request("ADD alice 0 9 * * 1 echo one").await;
        cluster.request("ADD bob 5 10 * * * echo two").await;
        cluster.stop().await;

        // 新实例从同一个任务文件起步
        let cluster = TestCluster::start(&path, Duration::from_secs(3600)).await;
        assert_eq!(
            cluster.request("LIST alice").await,
            "Scheduled Tasks:\nTask 1: [0 9 * * 1] echo one"
        );
        assert_eq!(
            cluster.request("LIST bob").await,
            "Scheduled Tasks:\nTask 2: [5 10 * * *] echo two"
        );
    }

    #[tokio::test]
    async fn on_disk_format_is_plain_json() {
        let dir = TempDir::new().unwrap();
        let path = tasks_path(&dir);
        let cluster = TestCluster::start(&path, Duration::from_secs(3600)).await;

        cluster.request("ADD alice 0 9 * * 1 echo hi").await;

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([{
                "id": 1,
                "username": "alice",
                "schedule": "0 9 * * 1",
                "command": "echo hi"
            }])
        );
    }

    #[tokio::test]
    async fn matching_task_is_pushed_to_registered_agent() {
        let dir = TempDir::new().unwrap();
        // 短派发间隔，通配调度每轮都命中
        let cluster = TestCluster::start(tasks_path(&dir), Duration::from_millis(300)).await;

        // 模拟代理的命令接收端
        let agent = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let agent_port = agent.local_addr().unwrap().port();

        cluster
            .request(&format!("REGISTER worker {agent_port}"))
            .await;
        cluster.request("ADD worker * * * * * echo from-afar").await;

        let accepted = tokio::time::timeout(Duration::from_secs(5), agent.accept())
            .await
            .expect("派发循环没有推送命令");
        let (mut stream, _) = accepted.unwrap();

        let mut pushed = Vec::new();
        stream.read_to_end(&mut pushed).await.unwrap();
        assert_eq!(pushed, b"echo from-afar");
    }

    #[tokio::test]
    async fn unregistered_owner_is_never_pushed_to() {
        let dir = TempDir::new().unwrap();
        let cluster = TestCluster::start(tasks_path(&dir), Duration::from_millis(200)).await;

        // 只注册bob，alice的任务应当被跳过
        let agent = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let agent_port = agent.local_addr().unwrap().port();
        cluster.request(&format!("REGISTER bob {agent_port}")).await;
        cluster.request("ADD alice * * * * * echo not-yours").await;

        let accepted = tokio::time::timeout(Duration::from_millis(800), agent.accept()).await;
        assert!(accepted.is_err(), "未注册属主的任务不应被推送");
    }

    // 确认send_command与服务端的应答闭环: 服务端读到EOF后关闭连接
    #[tokio::test]
    async fn each_request_gets_a_complete_reply_on_its_own_connection() {
        let dir = TempDir::new().unwrap();
        let cluster = TestCluster::start(tasks_path(&dir), Duration::from_secs(3600)).await;

        for _ in 0..3 {
            assert_eq!(cluster.request("PING").await, "PONG");
        }
    }
}
