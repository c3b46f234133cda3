// src/client/config.rs

use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::address::ServerAddress;
use crate::common::consts::{
    DEFAULT_HTTP_CLIENT_AGENT, DEFAULT_HTTP_CLIENT_TIMEOUT, DEFAULT_LANGUAGE,
    DEFAULT_MAX_REDIRECTS, DEFAULT_SCHEME, MAX_ADDRESS_LEN,
};
use crate::common::error::{QservError, Result};

/// 进程级共享、可读写的配置快照
pub type SharedConfig = Arc<RwLock<ClientConfig>>;

// 客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    // 游戏服务器地址（重定向时会被改写）
    #[serde(default)]
    pub game_server_address: String,

    // HTTP 代理地址
    #[serde(default)]
    pub proxy_address: String,

    // 缺省游戏服务器地址
    #[serde(default)]
    pub default_game_server_address: String,

    // 语言编号
    #[serde(default = "default_language")]
    pub language: i32,

    // 最大重定向次数，0 表示不限制
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    // HTTP 客户端配置
    #[serde(default)]
    pub http_client: HttpClientConfig,
}

// HTTP 客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpClientConfig {
    // 超时时间（秒）
    #[serde(default = "default_http_client_timeout")]
    pub timeout: u64,

    // User-Agent
    #[serde(default = "default_http_client_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            game_server_address: String::new(),
            proxy_address: String::new(),
            default_game_server_address: String::new(),
            language: default_language(),
            max_redirects: default_max_redirects(),
            http_client: HttpClientConfig::default(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_client_timeout(),
            user_agent: default_http_client_agent(),
        }
    }
}

// 默认值函数 - 使用 consts 中定义的常量
fn default_language() -> i32 {
    DEFAULT_LANGUAGE
}

fn default_max_redirects() -> u32 {
    DEFAULT_MAX_REDIRECTS
}

fn default_http_client_timeout() -> u64 {
    DEFAULT_HTTP_CLIENT_TIMEOUT
}

fn default_http_client_agent() -> String {
    DEFAULT_HTTP_CLIENT_AGENT.to_string()
}

impl ClientConfig {
    // 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .map_err(|e| QservError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    // 从 YAML 文本解析配置
    pub fn from_yaml(config_str: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(config_str)
            .map_err(|e| QservError::Config(format!("Failed to parse config: {}", e)))?;

        // 验证配置
        config.test()?;

        Ok(config)
    }

    // 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_str = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), config_str)?;
        debug!(path = ?path.as_ref(), "Configuration saved");
        Ok(())
    }

    // 验证配置
    pub fn test(&self) -> Result<()> {
        let addresses = [
            ("game_server_address", &self.game_server_address),
            ("proxy_address", &self.proxy_address),
            ("default_game_server_address", &self.default_game_server_address),
        ];

        for (name, value) in addresses {
            if value.chars().count() > MAX_ADDRESS_LEN {
                return Err(QservError::Config(format!(
                    "{} exceeds {} characters",
                    name, MAX_ADDRESS_LEN
                )));
            }

            check_scheme(name, value)?;
        }

        if self.http_client.timeout == 0 {
            return Err(QservError::Config(
                "http_client.timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    // 设置游戏服务器地址，超长部分被截断
    pub fn set_game_server_address(&mut self, address: &str) {
        self.game_server_address = truncate_chars(address, MAX_ADDRESS_LEN).to_string();
    }

    // 只把游戏服务器地址写回配置文件，文件中的其他设置保持不变
    pub fn persist_game_server_address<P: AsRef<Path>>(path: P, address: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.set_game_server_address(address);
        config.test()?;
        config.save_to_file(path)?;
        Ok(config)
    }

    // 获取 HTTP 超时时间
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_client.timeout)
    }

    // 转换为共享配置
    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}

/// 按字符数截断，保证落在字符边界上
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// 地址只接受空 scheme 或 `http`
pub fn check_scheme(name: &str, value: &str) -> Result<()> {
    let address = ServerAddress::parse(value);
    if !address.scheme().is_empty() && address.scheme() != DEFAULT_SCHEME {
        return Err(QservError::InvalidAddress(format!(
            "{}: unsupported scheme '{}'",
            name,
            address.scheme()
        )));
    }
    Ok(())
}
