#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use tempfile::TempDir;

    use telecron_server::CommandHandler;
    use telecron_storage::{CoordinatorState, TaskStore};

    fn peer() -> IpAddr {
        "10.0.0.5".parse().unwrap()
    }

    async fn handler_in(dir: &TempDir) -> (CommandHandler, CoordinatorState) {
        let state = CoordinatorState::new(TaskStore::open(dir.path().join("tasks.json")).await);
        (CommandHandler::new(state.clone()), state)
    }

    #[tokio::test]
    async fn ping_replies_pong() {
        let dir = TempDir::new().unwrap();
        let (handler, _) = handler_in(&dir).await;

        assert_eq!(handler.handle_line("PING", peer()).await, "PONG");
    }

    #[tokio::test]
    async fn register_acks_and_records_peer_ip() {
        let dir = TempDir::new().unwrap();
        let (handler, state) = handler_in(&dir).await;

        let reply = handler.handle_line("REGISTER alice 6060", peer()).await;
        assert_eq!(reply, "ACK: Registered alice at 10.0.0.5:6060");

        // 注册表里记录的是连接对端IP加自报端口
        assert_eq!(
            state.clients.read().await.resolve("alice"),
            Some("10.0.0.5:6060".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn reregistration_overwrites_endpoint() {
        let dir = TempDir::new().unwrap();
        let (handler, state) = handler_in(&dir).await;

        handler.handle_line("REGISTER alice 6060", peer()).await;
        handler
            .handle_line("REGISTER alice 7070", "10.0.0.9".parse().unwrap())
            .await;

        assert_eq!(
            state.clients.read().await.resolve("alice"),
            Some("10.0.0.9:7070".parse().unwrap())
        );
    }

    #[tokio::test]
    async fn add_acks_with_consecutive_ids() {
        let dir = TempDir::new().unwrap();
        let (handler, _) = handler_in(&dir).await;

        let reply = handler.handle_line("ADD alice 0 9 * * 1 echo hi", peer()).await;
        assert_eq!(reply, "ACK: Task 1 added with schedule '0 9 * * 1'");

        let reply = handler.handle_line("ADD alice 30 18 * * 5 backup.sh", peer()).await;
        assert_eq!(reply, "ACK: Task 2 added with schedule '30 18 * * 5'");
    }

    #[tokio::test]
    async fn add_with_bad_schedule_replies_err_and_mutates_nothing() {
        let dir = TempDir::new().unwrap();
        let (handler, state) = handler_in(&dir).await;

        let reply = handler.handle_line("ADD alice 99 9 * * 1 echo hi", peer()).await;
        assert!(reply.starts_with("ERR: Invalid schedule:"), "应答: {}", reply);

        assert!(state.tasks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn list_with_no_tasks_is_header_only() {
        let dir = TempDir::new().unwrap();
        let (handler, _) = handler_in(&dir).await;

        // 空清单不是错误
        assert_eq!(handler.handle_line("LIST alice", peer()).await, "Scheduled Tasks:");
    }

    #[tokio::test]
    async fn list_shows_only_that_users_tasks() {
        let dir = TempDir::new().unwrap();
        let (handler, _) = handler_in(&dir).await;

        handler.handle_line("ADD alice 0 9 * * 1 echo hi", peer()).await;
        handler.handle_line("ADD bob * * * * * uptime", peer()).await;
        handler.handle_line("ADD alice 0 18 * * 5 report.sh", peer()).await;

        let reply = handler.handle_line("LIST alice", peer()).await;
        assert_eq!(
            reply,
            "Scheduled Tasks:\nTask 1: [0 9 * * 1] echo hi\nTask 3: [0 18 * * 5] report.sh"
        );
    }

    #[tokio::test]
    async fn list_reloads_from_disk_first() {
        let dir = TempDir::new().unwrap();
        let (handler, _) = handler_in(&dir).await;

        // 任务文件被外部直接改写
        std::fs::write(
            dir.path().join("tasks.json"),
            r#"[{"id": 4, "username": "alice", "schedule": "* * * * *", "command": "date"}]"#,
        )
        .unwrap();

        let reply = handler.handle_line("LIST alice", peer()).await;
        assert_eq!(reply, "Scheduled Tasks:\nTask 4: [* * * * *] date");
    }

    #[tokio::test]
    async fn remove_acks_or_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let (handler, state) = handler_in(&dir).await;

        handler.handle_line("ADD alice 0 9 * * 1 echo hi", peer()).await;

        let reply = handler.handle_line("REMOVE 99", peer()).await;
        assert_eq!(reply, "ERR: Task ID not found");
        // 软错误，任务不受影响
        assert_eq!(state.tasks.lock().await.len(), 1);

        let reply = handler.handle_line("REMOVE 1", peer()).await;
        assert_eq!(reply, "ACK: Task 1 removed");
        assert!(state.tasks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn remove_without_id_names_the_problem() {
        let dir = TempDir::new().unwrap();
        let (handler, _) = handler_in(&dir).await;

        assert_eq!(
            handler.handle_line("REMOVE", peer()).await,
            "ERR: No Task ID provided"
        );
    }

    #[tokio::test]
    async fn clear_and_status_report_counts() {
        let dir = TempDir::new().unwrap();
        let (handler, _) = handler_in(&dir).await;

        assert_eq!(
            handler.handle_line("STATUS", peer()).await,
            "STATUS: 0 tasks loaded."
        );

        handler.handle_line("ADD alice * * * * * one", peer()).await;
        handler.handle_line("ADD alice * * * * * two", peer()).await;
        assert_eq!(
            handler.handle_line("STATUS", peer()).await,
            "STATUS: 2 tasks loaded."
        );

        assert_eq!(
            handler.handle_line("CLEAR", peer()).await,
            "All tasks cleared."
        );
        assert_eq!(
            handler.handle_line("STATUS", peer()).await,
            "STATUS: 0 tasks loaded."
        );
    }

    #[tokio::test]
    async fn save_and_load_verbs_round_trip() {
        let dir = TempDir::new().unwrap();
        let (handler, _) = handler_in(&dir).await;

        handler.handle_line("ADD alice * * * * * one", peer()).await;
        assert_eq!(handler.handle_line("SAVE", peer()).await, "Tasks saved.");

        // 外部改写后用LOAD强制重载
        std::fs::write(
            dir.path().join("tasks.json"),
            r#"[{"id": 1, "username": "a", "schedule": "* * * * *", "command": "x"},
                {"id": 2, "username": "a", "schedule": "* * * * *", "command": "y"}]"#,
        )
        .unwrap();

        assert_eq!(handler.handle_line("LOAD", peer()).await, "Tasks loaded.");
        assert_eq!(
            handler.handle_line("STATUS", peer()).await,
            "STATUS: 2 tasks loaded."
        );
    }

    #[tokio::test]
    async fn unknown_and_empty_commands_get_errors() {
        let dir = TempDir::new().unwrap();
        let (handler, _) = handler_in(&dir).await;

        assert_eq!(
            handler.handle_line("HELLO world", peer()).await,
            "ERR: Unknown command"
        );
        assert_eq!(handler.handle_line("", peer()).await, "ERR: Empty command");
    }
}
