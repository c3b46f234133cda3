// src/common/error.rs

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum QservError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(String),

    /// 序列化/反序列化错误
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_yaml::Error),

    /// JSON 输出错误
    #[error("JSON processing error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP 客户端错误
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 无效的服务器地址
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// 无效的命令行参数
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, QservError>;
