// src/client/endpoint.rs

//! 请求目标解析。
//!
//! 三层地址来源按固定顺序叠加：
//! 1. `default_game_server_address`：补全端口 80、默认主机和默认 CGI 路径；
//! 2. `game_server_address`：缺失部分从第 1 层继承，协议缺省为 http；
//! 3. `proxy_address`：仅补全端口 80。
//!
//! 配置了代理时，连接目标为代理，请求行使用完整 URL（正向代理格式）；
//! 否则直接连接游戏服务器，请求行只包含路径。

use std::net::SocketAddrV4;

use crate::client::address::ServerAddress;
use crate::client::config::ClientConfig;
use crate::client::transport::TransportTarget;
use crate::common::consts::{
    DEFAULT_GAME_SERVER_HOST, DEFAULT_GAME_SERVER_PATH, DEFAULT_HTTP_PORT, DEFAULT_SCHEME,
};

/// 一次请求的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// 补全后的游戏服务器地址
    pub server: ServerAddress,
    /// 实际连接的主机（代理或游戏服务器）
    pub host: String,
    /// 实际连接的端口
    pub port: u16,
    /// 请求行中的路径（代理模式下为完整 URL）
    pub path: String,
    /// 是否经由代理
    pub proxied: bool,
}

/// 叠加三层地址，得到请求目标
pub fn resolve_endpoint(
    primary: &ServerAddress,
    fallback: &ServerAddress,
    proxy: &ServerAddress,
) -> ResolvedTarget {
    let mut fallback = fallback.clone();
    if fallback.port() == 0 {
        fallback.set_port(DEFAULT_HTTP_PORT);
    }
    if fallback.host().is_empty() {
        fallback.set_host(DEFAULT_GAME_SERVER_HOST);
    }
    if fallback.has_default_path() {
        fallback.set_path(DEFAULT_GAME_SERVER_PATH);
    }

    let mut server = primary.clone();
    if server.scheme().is_empty() {
        server.set_scheme(DEFAULT_SCHEME);
    }
    if server.port() == 0 {
        server.set_port(fallback.port());
    }
    if server.host().is_empty() {
        server.set_host(fallback.host());
    }
    if server.has_default_path() {
        server.set_path(fallback.path());
    }

    let mut proxy = proxy.clone();
    if proxy.port() == 0 {
        proxy.set_port(DEFAULT_HTTP_PORT);
    }

    if !proxy.host().is_empty() {
        ResolvedTarget {
            host: proxy.host().to_string(),
            port: proxy.port(),
            path: server.full(),
            proxied: true,
            server,
        }
    } else {
        ResolvedTarget {
            host: server.host().to_string(),
            port: server.port(),
            path: server.path().to_string(),
            proxied: false,
            server,
        }
    }
}

impl ResolvedTarget {
    /// 从配置中的三个地址字段解析
    pub fn from_config(config: &ClientConfig) -> Self {
        resolve_endpoint(
            &ServerAddress::parse(&config.game_server_address),
            &ServerAddress::parse(&config.default_game_server_address),
            &ServerAddress::parse(&config.proxy_address),
        )
    }

    /// 应用地址缓存，生成交给传输层的目标。
    /// 缓存命中时使用缓存的数字地址与端口，跳过主机名解析。
    pub fn transport_target(&self, cached: Option<SocketAddrV4>) -> TransportTarget {
        TransportTarget {
            host: self.host.clone(),
            port: cached.map(|addr| addr.port()).unwrap_or(self.port),
            path: self.path.clone(),
            proxied: self.proxied,
            pinned: cached,
        }
    }
}
