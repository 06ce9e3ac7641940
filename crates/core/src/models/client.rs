//! 客户端注册信息

use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// 客户端命令接收端点
///
/// IP取自注册连接的对端地址，端口由客户端在REGISTER请求中自报。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientEndpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl ClientEndpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    /// 可直接发起连接的套接字地址
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for ClientEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}
