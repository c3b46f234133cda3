// src/client/address.rs

//! 宽松的服务器地址解析器。
//!
//! 配置文件中的地址可能只填写了部分内容（例如只有主机名、只有路径，
//! 或者是 `proxy:3128` 这样的代理地址），因此解析永远不会失败：
//! 缺失的部分用中性值表示，由调用方按层级补全。
//!
//! 语法: `[scheme "://"] [host] [":" port] [path]`

use std::fmt;

/// 解析后的服务器地址
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerAddress {
    // 协议，缺失时为空串
    scheme: String,
    // 主机，缺失时为空串
    host: String,
    // 端口，缺失或无法解析时为 0
    port: u16,
    // 路径，缺失时为 "/"
    path: String,
}

impl ServerAddress {
    /// 解析地址字符串
    pub fn parse(input: &str) -> Self {
        let input = input.trim();

        let (scheme, rest) = match input.find("://") {
            Some(idx) => (&input[..idx], &input[idx + 3..]),
            None => ("", input),
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };

        let (host, port) = split_host_port(authority);

        Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            port,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_scheme(&mut self, scheme: &str) {
        self.scheme = scheme.to_ascii_lowercase();
    }

    /// 设置主机；`host:port` 形式会同时设置端口
    pub fn set_host(&mut self, host: &str) {
        let (host, port) = split_host_port(host);
        self.host = host.to_string();
        if port != 0 {
            self.port = port;
        }
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn set_path(&mut self, path: &str) {
        self.path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
    }

    /// 路径是否缺失（空或根路径）
    pub fn has_default_path(&self) -> bool {
        self.path.is_empty() || self.path == "/"
    }

    /// 重新拼装完整 URL: `scheme://host[:port]path`
    pub fn full(&self) -> String {
        let mut full = String::new();
        if !self.scheme.is_empty() {
            full.push_str(&self.scheme);
            full.push_str("://");
        }
        full.push_str(&self.host);
        if self.port != 0 {
            full.push(':');
            full.push_str(&self.port.to_string());
        }
        full.push_str(&self.path);
        full
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full())
    }
}

// 拆分 host[:port]，端口无法解析时视为缺失；`[...]` 内的冒号属于 IPv6 字面量
fn split_host_port(authority: &str) -> (&str, u16) {
    if authority.starts_with('[') {
        if let Some(end) = authority.find(']') {
            let (host, rest) = authority.split_at(end + 1);
            let port = rest.strip_prefix(':').map_or(0, |port| port.parse().unwrap_or(0));
            return (host, port);
        }
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => (host, port.parse().unwrap_or(0)),
        None => (authority, 0),
    }
}
