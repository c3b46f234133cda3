// src/client/query.rs

//! qserv 查询请求的生命周期。
//!
//! 使用流程：
//! 1. `QueryClient::new` 解析目标地址并创建传输层，写入 `data=` 前缀；
//! 2. `add_field` / `add_field_fmt` / `add_field_raw` 追加请求数据；
//! 3. `send` 追加平台信息字段并开始发送（非阻塞）；
//! 4. 反复调用 `done` 直到返回 true；
//! 5. 通过 `status` / `reply` 读取结果。
//!
//! 收到 "Redirect permanent" 时，`done` 会改写配置中的游戏服务器地址，
//! 用新的传输层重放原请求体并继续返回 false，重定向对调用方透明。

use std::fmt;
use std::mem;
use std::sync::{Arc, PoisonError, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::address::ServerAddress;
use crate::client::cache::AddressCache;
use crate::client::config::{check_scheme, truncate_chars, ClientConfig, SharedConfig};
use crate::client::dict::ResponseDict;
use crate::client::endpoint::ResolvedTarget;
use crate::client::lines::LineSplitter;
use crate::client::platform::PlatformInfo;
use crate::client::transport::{url_encode, Transport, TransportFactory};
use crate::common::consts::{
    CLIENT_VERSION, MAX_STATUS_LEN, PAYLOAD_PREFIX, REDIRECT_LOCATION_KEY, REDIRECT_STATUS,
};
use crate::common::error::Result;

/// 发起查询所需的协作者
#[derive(Clone)]
pub struct QueryContext {
    /// 共享配置，重定向时会被改写
    pub config: SharedConfig,
    /// 地址缓存
    pub cache: AddressCache,
    /// 传输层工厂
    pub factory: Arc<dyn TransportFactory>,
    /// 上报的平台信息
    pub platform: PlatformInfo,
}

impl QueryContext {
    /// 使用进程级地址缓存与自动检测的平台信息
    pub fn new(config: SharedConfig, factory: Arc<dyn TransportFactory>) -> Self {
        Self {
            config,
            cache: AddressCache::global(),
            factory,
            platform: PlatformInfo::default(),
        }
    }

    pub fn with_cache(mut self, cache: AddressCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_platform(mut self, platform: PlatformInfo) -> Self {
        self.platform = platform;
        self
    }
}

/// 对外可见的请求状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// 已创建，尚未发送
    Pending,
    /// 传输进行中（包括重定向后的新请求）
    InFlight,
    /// 已结束
    Done,
}

// 内部阶段，持有当前的传输层
enum Stage {
    Pending(Box<dyn Transport>),
    InFlight(Box<dyn Transport>),
    Done,
}

/// qserv 查询客户端
pub struct QueryClient {
    ctx: QueryContext,
    stage: Stage,
    status: String,
    reply: Option<ResponseDict>,
    redirects: u32,
}

fn read_config(config: &SharedConfig) -> RwLockReadGuard<'_, ClientConfig> {
    config.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_config(config: &SharedConfig) -> RwLockWriteGuard<'_, ClientConfig> {
    config.write().unwrap_or_else(PoisonError::into_inner)
}

impl QueryClient {
    /// 创建请求并写入固定的 `data=` 前缀
    pub fn new(ctx: &QueryContext) -> Self {
        let transport = Self::create_request(ctx);
        let mut client = Self {
            ctx: ctx.clone(),
            stage: Stage::Pending(transport),
            status: String::new(),
            reply: None,
            redirects: 0,
        };
        client.add_field_raw(PAYLOAD_PREFIX);
        client
    }

    // 按当前配置与地址缓存创建一个新的传输层
    fn create_request(ctx: &QueryContext) -> Box<dyn Transport> {
        let resolved = ResolvedTarget::from_config(&read_config(&ctx.config));
        let target = resolved.transport_target(ctx.cache.get());

        debug!(
            server = %resolved.server,
            host = %target.host,
            port = target.port,
            path = %target.path,
            proxied = target.proxied,
            pinned = ?target.pinned,
            "Creating qserv request"
        );

        ctx.factory.create(&target)
    }

    fn transport(&self) -> Option<&dyn Transport> {
        match &self.stage {
            Stage::Pending(transport) | Stage::InFlight(transport) => Some(&**transport),
            Stage::Done => None,
        }
    }

    /// 表单编码后追加一个字段
    pub fn add_field(&mut self, field: &str) {
        self.add_field_raw(url_encode(field).as_bytes());
    }

    /// 格式化、表单编码后追加一个字段
    pub fn add_field_fmt(&mut self, args: fmt::Arguments<'_>) {
        self.add_field(&args.to_string());
    }

    /// 追加已编码的数据，不再做任何转换
    pub fn add_field_raw(&mut self, data: &[u8]) {
        match &mut self.stage {
            Stage::Pending(transport) | Stage::InFlight(transport) => transport.add_raw_data(data),
            Stage::Done => warn!(bytes = data.len(), "Ignoring data added to a finished query"),
        }
    }

    /// 追加平台信息字段并开始发送
    pub fn send(&mut self) {
        if !matches!(self.stage, Stage::Pending(_)) {
            warn!(state = ?self.state(), "Query already sent");
            return;
        }

        let language = read_config(&self.ctx.config).language;
        let platform = self.ctx.platform;
        self.add_field_fmt(format_args!("info/language {}\n", language));
        self.add_field_fmt(format_args!("info/quadra_version {}\n", CLIENT_VERSION));
        self.add_field_fmt(format_args!("info/platform/os {}\n", platform.os));
        self.add_field_fmt(format_args!("info/platform/display {}\n", platform.display));

        if let Stage::Pending(mut transport) = mem::replace(&mut self.stage, Stage::Done) {
            transport.send();
            self.stage = Stage::InFlight(transport);
        }
    }

    /// 轮询请求进度，结束时返回 true。
    /// 重定向在内部完成，期间始终返回 false。
    pub fn done(&mut self) -> bool {
        let transport = match &self.stage {
            Stage::Done => return true,
            Stage::Pending(transport) | Stage::InFlight(transport) => transport,
        };

        if !transport.is_done() {
            return false;
        }

        // 在确认应答可用之前清空地址缓存
        self.ctx.cache.clear();

        let mut reply = ResponseDict::new();
        let received = transport.received_size();
        if received <= 0 {
            self.status.clear();
        } else {
            let buffer = transport.buffer();
            let len = buffer.len().min(received as usize);
            self.status = parse_response(&LineSplitter::new(&buffer[..len]), &mut reply);

            self.ctx.cache.arm(transport.host_addr(), transport.host_port());
        }
        self.reply = Some(reply);

        if self.is_redirect() {
            if let Err(e) = self.check_redirect_location() {
                warn!(error = %e, "Unsupported redirect location, returning redirect response");
            } else if self.may_follow_redirect() {
                self.follow_redirect();
                return false;
            } else {
                warn!(
                    redirects = self.redirects,
                    "Redirect limit reached, returning redirect response"
                );
            }
        }

        self.stage = Stage::Done;
        debug!(status = %self.status, received = received, "qserv query done");
        true
    }

    fn is_redirect(&self) -> bool {
        self.status == REDIRECT_STATUS
            && self
                .reply
                .as_ref()
                .is_some_and(|reply| reply.lookup(REDIRECT_LOCATION_KEY).is_some())
    }

    // 重定向目标必须能通过配置校验，否则写回后配置将无法加载
    fn check_redirect_location(&self) -> Result<()> {
        let location = self
            .reply
            .as_ref()
            .and_then(|reply| reply.lookup(REDIRECT_LOCATION_KEY))
            .unwrap_or_default();
        check_scheme(REDIRECT_LOCATION_KEY, location)
    }

    fn may_follow_redirect(&self) -> bool {
        let max_redirects = read_config(&self.ctx.config).max_redirects;
        max_redirects == 0 || self.redirects < max_redirects
    }

    // 改写配置中的服务器地址，然后用同样的请求体重新发起请求
    fn follow_redirect(&mut self) {
        let location = self
            .reply
            .as_ref()
            .and_then(|reply| reply.lookup(REDIRECT_LOCATION_KEY))
            .unwrap_or_default()
            .to_string();

        let proxied = {
            let mut config = write_config(&self.ctx.config);
            info!(
                from = %config.game_server_address,
                to = %location,
                "qserv redirect permanent"
            );
            config.set_game_server_address(&location);
            !ServerAddress::parse(&config.proxy_address).host().is_empty()
        };

        // 新目标是不同的源，除非仍然经由同一个代理
        if !proxied {
            self.ctx.cache.clear();
        }

        let payload = match mem::replace(&mut self.stage, Stage::Done) {
            Stage::Pending(transport) | Stage::InFlight(transport) => transport.sent_data(),
            Stage::Done => Vec::new(),
        };
        self.reply = None;
        self.status.clear();

        self.rebuild(payload);
    }

    // 创建新的传输层，重放请求体并发送
    fn rebuild(&mut self, payload: Vec<u8>) {
        let mut transport = Self::create_request(&self.ctx);
        transport.add_raw_data(&payload);
        transport.send();
        self.stage = Stage::InFlight(transport);
        self.redirects += 1;
    }

    /// 以固定间隔轮询直到结束
    pub async fn wait(&mut self, poll_interval: Duration) {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        while !self.done() {
            ticker.tick().await;
        }
    }

    /// 状态行；没有可用应答时为 None
    pub fn status(&self) -> Option<&str> {
        if self.status.is_empty() {
            None
        } else {
            Some(self.status.as_str())
        }
    }

    /// 解析后的应答；尚未完成任何一次应答时为 None
    pub fn reply(&self) -> Option<&ResponseDict> {
        self.reply.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.transport().is_some_and(|transport| transport.is_connected())
    }

    /// 当前传输层已接收的字节数，负值按 0 处理
    pub fn received_count(&self) -> u32 {
        self.transport()
            .map(|transport| transport.received_size().clamp(0, i64::from(u32::MAX)) as u32)
            .unwrap_or(0)
    }

    pub fn state(&self) -> QueryState {
        match self.stage {
            Stage::Pending(_) => QueryState::Pending,
            Stage::InFlight(_) => QueryState::InFlight,
            Stage::Done => QueryState::Done,
        }
    }

    /// 已跟随的重定向次数
    pub fn redirects(&self) -> u32 {
        self.redirects
    }
}

// 跳过头部直到第一个空行，其后一行为状态行，剩余各行写入应答
fn parse_response(lines: &LineSplitter, reply: &mut ResponseDict) -> String {
    let mut lines = lines.iter();
    if !lines.by_ref().any(str::is_empty) {
        return String::new();
    }

    let status = match lines.next() {
        Some(line) => truncate_chars(line, MAX_STATUS_LEN).to_string(),
        None => return String::new(),
    };

    for line in lines {
        reply.insert_line(line);
    }

    status
}
