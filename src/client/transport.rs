// src/client/transport.rs

//! 传输层抽象与基于 reqwest 的 HTTP POST 实现。
//!
//! `QueryClient` 只通过同步的状态查询与传输层交互：
//! `send()` 立即返回，实际 I/O 在 tokio 运行时上进行，
//! 调用方通过 `is_done()` / `received_size()` 等方法轮询进度。

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::{header, redirect, Client, Proxy};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::client::config::ClientConfig;
use crate::common::consts::CONTENT_TYPE_FORM;
use crate::common::error::{QservError, Result};

/// 传输层连接目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportTarget {
    /// 连接的主机（代理或游戏服务器）
    pub host: String,
    /// 连接的端口
    pub port: u16,
    /// 请求行路径（代理模式下为完整 URL）
    pub path: String,
    /// 是否经由代理
    pub proxied: bool,
    /// 缓存的数字地址，存在时跳过主机名解析
    pub pinned: Option<SocketAddrV4>,
}

/// 一次 HTTP POST 交换
pub trait Transport: Send {
    /// 追加原始请求体数据
    fn add_raw_data(&mut self, data: &[u8]);

    /// 开始发送（非阻塞）
    fn send(&mut self);

    /// 交换是否已结束
    fn is_done(&self) -> bool;

    /// 已接收的字节数，负数表示失败或未知
    fn received_size(&self) -> i64;

    /// 已接收的原始数据
    fn buffer(&self) -> Vec<u8>;

    fn is_connected(&self) -> bool;

    /// 实际连接的数字地址
    fn host_addr(&self) -> Option<Ipv4Addr>;

    /// 实际连接的端口
    fn host_port(&self) -> u16;

    /// 累计的请求体，用于重定向后重放
    fn sent_data(&self) -> Vec<u8>;
}

/// 传输层工厂，每次请求尝试创建一个新的 `Transport`
pub trait TransportFactory: Send + Sync {
    fn create(&self, target: &TransportTarget) -> Box<dyn Transport>;
}

/// 表单编码 (application/x-www-form-urlencoded，空格编码为 `+`)
pub fn url_encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

// 交换进度，由后台任务写入、轮询方读取
#[derive(Debug, Default)]
struct Exchange {
    connected: bool,
    done: bool,
    received: i64,
    buffer: Vec<u8>,
    peer: Option<SocketAddr>,
}

fn lock(exchange: &Mutex<Exchange>) -> MutexGuard<'_, Exchange> {
    exchange.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 基于 reqwest 的 HTTP POST 传输
pub struct HttpPost {
    target: TransportTarget,
    client: Option<Client>,
    url: String,
    body: Vec<u8>,
    exchange: Arc<Mutex<Exchange>>,
    runtime: Handle,
    task: Option<JoinHandle<()>>,
}

impl HttpPost {
    /// 创建传输；客户端构建失败时记录警告，发送时直接以失败结束
    pub fn new(target: &TransportTarget, runtime: Handle, timeout: Duration, user_agent: &str) -> Self {
        let client = match build_client(target, timeout, user_agent) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(host = %target.host, port = target.port, error = %e, "Failed to build HTTP client");
                None
            }
        };

        let url = if target.proxied {
            target.path.clone()
        } else {
            format!("http://{}:{}{}", target.host, target.port, target.path)
        };

        debug!(
            url = %url,
            proxied = target.proxied,
            pinned = ?target.pinned,
            "HTTP POST transport created"
        );

        Self {
            target: target.clone(),
            client,
            url,
            body: Vec::new(),
            exchange: Arc::new(Mutex::new(Exchange::default())),
            runtime,
            task: None,
        }
    }

    /// 请求 URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpPost {
    fn add_raw_data(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    fn send(&mut self) {
        if self.task.is_some() {
            return;
        }

        let Some(client) = self.client.clone() else {
            let mut exchange = lock(&self.exchange);
            exchange.received = -1;
            exchange.done = true;
            return;
        };

        debug!(url = %self.url, bytes = self.body.len(), "Sending qserv request");
        let task = run_exchange(client, self.url.clone(), self.body.clone(), Arc::clone(&self.exchange));
        self.task = Some(self.runtime.spawn(task));
    }

    fn is_done(&self) -> bool {
        lock(&self.exchange).done
    }

    fn received_size(&self) -> i64 {
        lock(&self.exchange).received
    }

    fn buffer(&self) -> Vec<u8> {
        lock(&self.exchange).buffer.clone()
    }

    fn is_connected(&self) -> bool {
        lock(&self.exchange).connected
    }

    fn host_addr(&self) -> Option<Ipv4Addr> {
        match lock(&self.exchange).peer {
            Some(SocketAddr::V4(peer)) => Some(*peer.ip()),
            Some(SocketAddr::V6(_)) => None,
            None => self
                .target
                .pinned
                .map(|pinned| *pinned.ip())
                .or_else(|| self.target.host.parse().ok()),
        }
    }

    fn host_port(&self) -> u16 {
        lock(&self.exchange)
            .peer
            .map(|peer| peer.port())
            .unwrap_or(self.target.port)
    }

    fn sent_data(&self) -> Vec<u8> {
        self.body.clone()
    }
}

impl Drop for HttpPost {
    fn drop(&mut self) {
        // 中止尚未完成的交换
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn build_client(target: &TransportTarget, timeout: Duration, user_agent: &str) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(redirect::Policy::none());

    builder = if target.proxied {
        builder.proxy(Proxy::http(format!("http://{}:{}", target.host, target.port))?)
    } else {
        builder.no_proxy()
    };

    // 端口以 URL 为准，覆盖只替换地址
    if let Some(pinned) = target.pinned {
        builder = builder.resolve(&target.host, SocketAddr::new(IpAddr::V4(*pinned.ip()), pinned.port()));
    }

    builder.build().map_err(QservError::Http)
}

// 把状态行与响应头渲染为文本，空行之后接响应体
fn render_head(response: &reqwest::Response) -> Vec<u8> {
    let mut head = format!("{:?} {}\r\n", response.version(), response.status()).into_bytes();
    for (name, value) in response.headers() {
        head.extend_from_slice(name.as_str().as_bytes());
        head.extend_from_slice(b": ");
        head.extend_from_slice(value.as_bytes());
        head.extend_from_slice(b"\r\n");
    }
    head.extend_from_slice(b"\r\n");
    head
}

async fn run_exchange(client: Client, url: String, body: Vec<u8>, exchange: Arc<Mutex<Exchange>>) {
    let result = client
        .post(&url)
        .header(header::CONTENT_TYPE, CONTENT_TYPE_FORM)
        .body(body)
        .send()
        .await;

    let mut response = match result {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %url, error = %e, "qserv request failed");
            let mut exchange = lock(&exchange);
            exchange.received = -1;
            exchange.done = true;
            return;
        }
    };

    {
        let head = render_head(&response);
        let mut exchange = lock(&exchange);
        exchange.connected = true;
        exchange.peer = response.remote_addr();
        exchange.received = head.len() as i64;
        exchange.buffer = head;
    }

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                trace!(bytes = chunk.len(), "Received response chunk");
                let mut exchange = lock(&exchange);
                exchange.buffer.extend_from_slice(&chunk);
                exchange.received = exchange.buffer.len() as i64;
            }
            Ok(None) => break,
            Err(e) => {
                // 保留已收到的部分
                warn!(url = %url, error = %e, "qserv response body interrupted");
                break;
            }
        }
    }

    let mut exchange = lock(&exchange);
    exchange.connected = false;
    exchange.done = true;
    debug!(url = %url, received = exchange.received, "qserv exchange finished");
}

/// `HttpPost` 工厂
#[derive(Debug, Clone)]
pub struct HttpPostFactory {
    runtime: Handle,
    timeout: Duration,
    user_agent: String,
}

impl HttpPostFactory {
    pub fn new(runtime: Handle, config: &ClientConfig) -> Self {
        Self {
            runtime,
            timeout: config.http_timeout(),
            user_agent: config.http_client.user_agent.clone(),
        }
    }

    /// 使用当前 tokio 运行时
    pub fn from_current(config: &ClientConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| QservError::Other(format!("No tokio runtime available: {}", e)))?;
        Ok(Self::new(runtime, config))
    }
}

impl TransportFactory for HttpPostFactory {
    fn create(&self, target: &TransportTarget) -> Box<dyn Transport> {
        Box::new(HttpPost::new(target, self.runtime.clone(), self.timeout, &self.user_agent))
    }
}
