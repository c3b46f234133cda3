// src/client/platform.rs

//! 随每个请求上报的平台信息 (`info/platform/os`, `info/platform/display`)。

use std::fmt;

use serde::Serialize;

/// 操作系统
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlatformOs {
    Windows,
    LinuxI386,
}

/// 显示后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayKind {
    // 无显示子系统
    None,
    DirectX,
    Xlib,
}

impl PlatformOs {
    /// 编译目标对应的系统
    pub fn current() -> Self {
        if cfg!(windows) {
            PlatformOs::Windows
        } else {
            PlatformOs::LinuxI386
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformOs::Windows => "Windows",
            PlatformOs::LinuxI386 => "Linux i386",
        }
    }
}

impl DisplayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayKind::None => "None",
            DisplayKind::DirectX => "DirectX",
            DisplayKind::Xlib => "Xlib",
        }
    }
}

impl fmt::Display for PlatformOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 平台信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub os: PlatformOs,
    pub display: DisplayKind,
}

impl PlatformInfo {
    /// 根据编译目标与是否有显示子系统推断
    pub fn detect(headless: bool) -> Self {
        let os = PlatformOs::current();
        let display = match (headless, os) {
            (true, _) => DisplayKind::None,
            (false, PlatformOs::Windows) => DisplayKind::DirectX,
            (false, PlatformOs::LinuxI386) => DisplayKind::Xlib,
        };

        Self { os, display }
    }
}

impl Default for PlatformInfo {
    fn default() -> Self {
        Self::detect(false)
    }
}
