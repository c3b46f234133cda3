// src/client/output.rs

//! 查询结果的输出：彩色文本或 JSON。

use colored::Colorize;
use serde::Serialize;

use crate::client::dict::ResponseDict;
use crate::client::query::QueryClient;
use crate::common::error::{QservError, Result};

/// 查询结果摘要
#[derive(Debug, Serialize)]
pub struct QueryOutcome<'a> {
    pub status: Option<&'a str>,
    pub redirects: u32,
    pub server: String,
    pub reply: Option<&'a ResponseDict>,
}

impl<'a> QueryOutcome<'a> {
    pub fn new(client: &'a QueryClient, server: String) -> Self {
        Self {
            status: client.status(),
            redirects: client.redirects(),
            server,
            reply: client.reply(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(QservError::Json)
    }
}

/// 打印查询结果
pub fn print_outcome(outcome: &QueryOutcome<'_>) {
    println!("{} {}", ";; SERVER:".bold(), outcome.server);
    if outcome.redirects > 0 {
        println!("{} {}", ";; REDIRECTS:".bold(), outcome.redirects);
    }

    match outcome.status {
        Some(status) => println!("{} {}", ";; STATUS:".bold(), status.green()),
        None => println!("{} {}", ";; STATUS:".bold(), "<no response>".red()),
    }

    if let Some(reply) = outcome.reply {
        if !reply.is_empty() {
            println!("\n{}", ";; REPLY:".bold());
            for (key, value) in reply.iter() {
                println!("{}\t{}", key.cyan(), value);
            }
        }
    }
}

/// 打印错误信息
pub fn print_error(err: &QservError) {
    eprintln!("{} {}", "Error:".red().bold(), err);
}
