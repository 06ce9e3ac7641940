//! 客户端注册表
//!
//! 用户名到命令接收端点的内存映射。不持久化，不过期，不支持注销；
//! 进程重启后客户端需要重新注册。

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use telecron_core::models::ClientEndpoint;

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, ClientEndpoint>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记或覆盖客户端端点，后写覆盖先写
    ///
    /// IP取注册连接的对端地址，端口由客户端自报。返回登记后的端点。
    pub fn register(&mut self, username: impl Into<String>, ip: IpAddr, port: u16) -> ClientEndpoint {
        let endpoint = ClientEndpoint::new(ip, port);
        self.clients.insert(username.into(), endpoint);
        endpoint
    }

    /// 解析用户的派发地址，未注册返回None
    pub fn resolve(&self, username: &str) -> Option<SocketAddr> {
        self.clients.get(username).map(ClientEndpoint::socket_addr)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(text: &str) -> IpAddr {
        text.parse().unwrap()
    }

    #[test]
    fn register_and_resolve() {
        let mut registry = ClientRegistry::new();
        registry.register("alice", ip("10.0.0.5"), 6060);

        assert_eq!(
            registry.resolve("alice"),
            Some("10.0.0.5:6060".parse().unwrap())
        );
        assert_eq!(registry.resolve("bob"), None);
    }

    #[test]
    fn reregistration_overwrites_previous_endpoint() {
        let mut registry = ClientRegistry::new();
        registry.register("alice", ip("10.0.0.5"), 6060);
        registry.register("alice", ip("10.0.0.9"), 7070);

        // 后写覆盖先写，条目数不变
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.resolve("alice"),
            Some("10.0.0.9:7070".parse().unwrap())
        );
    }
}
