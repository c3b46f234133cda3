// src/client/cache.rs

//! 服务器地址缓存。
//!
//! 一次成功的交换之后记录传输层实际连接的数字地址与端口，
//! 后续请求直接使用该地址，避免重复的 DNS 解析。
//! 只有 `arm` 与 `clear` 两种修改方式；句柄可克隆，克隆之间共享同一份状态。

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;
use tracing::trace;

// 进程级共享缓存
static GLOBAL_CACHE: Lazy<AddressCache> = Lazy::new(AddressCache::new);

/// 地址缓存句柄
#[derive(Debug, Clone, Default)]
pub struct AddressCache {
    inner: Arc<Mutex<Option<SocketAddrV4>>>,
}

impl AddressCache {
    /// 创建独立的缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取进程级共享缓存
    pub fn global() -> Self {
        GLOBAL_CACHE.clone()
    }

    /// 当前缓存的地址
    pub fn get(&self) -> Option<SocketAddrV4> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_armed(&self) -> bool {
        self.get().is_some()
    }

    /// 记录地址；地址缺失或为 0.0.0.0 时等同于清空
    pub fn arm(&self, addr: Option<Ipv4Addr>, port: u16) {
        let value = addr
            .filter(|addr| !addr.is_unspecified())
            .map(|addr| SocketAddrV4::new(addr, port));

        trace!(cached = ?value, "Address cache armed");
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// 清空缓存
    pub fn clear(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
