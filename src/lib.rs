// src/lib.rs

//! qserv-client: Quadra 游戏服务器查询协议 (qserv) 客户端库
//!
//! 通过 HTTP POST 与远端 qserv CGI 通信，按轮询方式驱动请求生命周期，
//! 解析伪 HTTP 响应，并透明处理 "Redirect permanent" 应用层重定向。

pub mod common;
pub mod client;
