// src/common/mod.rs

/// 公共常量与错误类型。
pub mod consts;
pub mod error;
