// src/common/consts.rs
//
// 本文件包含项目中使用的所有全局常量

//
// 通用常量
//

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "qserv.yaml";

/// 客户端版本号（作为 info/quadra_version 上报）
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

//
// 服务器地址常量
//

/// 默认 qserv 主机
pub const DEFAULT_GAME_SERVER_HOST: &str = "quadra.sourceforge.net";

/// 默认 HTTP 端口
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// 默认 qserv CGI 路径
pub const DEFAULT_GAME_SERVER_PATH: &str = "/cgi-bin/qserv.pl";

/// 缺省协议
pub const DEFAULT_SCHEME: &str = "http";

/// 配置中地址字段的最大长度（字符）
pub const MAX_ADDRESS_LEN: usize = 255;

//
// 协议常量
//

/// 请求体固定前缀
pub const PAYLOAD_PREFIX: &[u8] = b"data=";

/// 应用层重定向状态行
pub const REDIRECT_STATUS: &str = "Redirect permanent";

/// 重定向目标所在的应答键
pub const REDIRECT_LOCATION_KEY: &str = "location";

/// 状态行最大长度（字符）
pub const MAX_STATUS_LEN: usize = 255;

/// 请求体内容类型
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

//
// 客户端默认值
//

/// 默认语言编号
pub const DEFAULT_LANGUAGE: i32 = 0;

/// 默认最大重定向次数（0 表示不限制）
pub const DEFAULT_MAX_REDIRECTS: u32 = 8;

/// 默认 HTTP 超时时间（秒）
pub const DEFAULT_HTTP_CLIENT_TIMEOUT: u64 = 30;

/// 默认 User-Agent
pub const DEFAULT_HTTP_CLIENT_AGENT: &str = concat!("qserv-client/", env!("CARGO_PKG_VERSION"));

/// 默认轮询间隔（毫秒）
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;
