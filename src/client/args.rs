// src/client/args.rs

//! 使用 clap 定义和解析命令行参数。

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::client::address::ServerAddress;
use crate::client::config::ClientConfig;
use crate::common::consts::{DEFAULT_CONFIG_PATH, DEFAULT_POLL_INTERVAL_MS, MAX_ADDRESS_LEN};
use crate::common::error::{QservError, Result};

/// qserv 查询客户端命令行接口
#[derive(Parser, Debug, Clone)]
#[command(
    name = "qserv-cli",
    author,
    version,
    about = "Query client for the Quadra game server lookup service (qserv)\n\n\
             Sends form-encoded fields to the qserv CGI endpoint, follows\n\
             'Redirect permanent' replies and prints the parsed reply."
)]
pub struct CliArgs {
    /// 请求字段，每个字段单独编码并以换行结尾
    #[arg(value_name = "FIELD", help = "Request fields, e.g. 'request gamelist'")]
    pub fields: Vec<String>,

    /// 配置文件路径
    #[arg(
        short = 'c',
        long = "config",
        default_value = DEFAULT_CONFIG_PATH,
        help = "Client configuration file path (YAML format)"
    )]
    pub config: PathBuf,

    /// 覆盖游戏服务器地址
    #[arg(long = "server", help = "Override game_server_address")]
    pub server: Option<String>,

    /// 覆盖代理地址
    #[arg(long = "proxy", help = "Override proxy_address")]
    pub proxy: Option<String>,

    /// 覆盖语言编号
    #[arg(long = "language", help = "Override the reported language")]
    pub language: Option<i32>,

    /// 已编码的原始数据
    #[arg(long = "raw", help = "Append already form-encoded data verbatim")]
    pub raw: Vec<String>,

    /// 无显示子系统
    #[arg(long = "headless", action = ArgAction::SetTrue, help = "Report display 'None'")]
    pub headless: bool,

    /// 重定向后保存配置
    #[arg(long = "save", action = ArgAction::SetTrue, help = "After a redirect, write the new game server address to the config file (other settings in the file are kept)")]
    pub save: bool,

    /// JSON 输出
    #[arg(long = "json", action = ArgAction::SetTrue, help = "Print the result as JSON")]
    pub json: bool,

    /// 禁用颜色输出
    #[arg(long = "no-color", action = ArgAction::SetTrue, help = "Disable colored output")]
    pub no_color: bool,

    /// 轮询间隔（毫秒）
    #[arg(
        long = "poll-interval",
        default_value_t = DEFAULT_POLL_INTERVAL_MS,
        help = "Polling interval in milliseconds"
    )]
    pub poll_interval: u64,

    /// 调试日志
    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue, help = "Enable debug level logging")]
    pub debug: bool,
}

impl CliArgs {
    /// 验证命令行参数
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval == 0 {
            return Err(QservError::InvalidArgument(
                "poll interval must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [("server", &self.server), ("proxy", &self.proxy)] {
            let Some(value) = value else { continue };
            if value.chars().count() > MAX_ADDRESS_LEN {
                return Err(QservError::InvalidArgument(format!(
                    "--{} exceeds {} characters",
                    name, MAX_ADDRESS_LEN
                )));
            }
            let address = ServerAddress::parse(value);
            if !address.scheme().is_empty() && address.scheme() != "http" {
                return Err(QservError::InvalidArgument(format!(
                    "--{}: unsupported scheme '{}'",
                    name,
                    address.scheme()
                )));
            }
        }

        Ok(())
    }

    /// 加载配置文件（不存在时使用默认配置）并应用命令行覆盖
    pub fn load_config(&self) -> Result<ClientConfig> {
        let mut config = if self.config.exists() {
            ClientConfig::from_file(&self.config)?
        } else {
            ClientConfig::default()
        };

        if let Some(server) = &self.server {
            config.game_server_address = server.clone();
        }
        if let Some(proxy) = &self.proxy {
            config.proxy_address = proxy.clone();
        }
        if let Some(language) = self.language {
            config.language = language;
        }

        config.test()?;
        Ok(config)
    }
}
