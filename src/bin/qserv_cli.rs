// src/bin/qserv_cli.rs

//! qserv 查询客户端命令行工具
//!
//! 向 Quadra 游戏服务器查询服务发送请求并打印解析后的应答：
//! - 按配置文件（或命令行覆盖）解析服务器与代理地址
//! - 每个 FIELD 参数作为一个表单编码字段发送
//! - 透明跟随 "Redirect permanent"，可选择把新地址写回配置文件

use std::process::exit;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use mimalloc::MiMalloc;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qserv_client::client::endpoint::ResolvedTarget;
use qserv_client::client::platform::PlatformInfo;
use qserv_client::client::{
    print_error, print_outcome, CliArgs, ClientConfig, HttpPostFactory, QueryClient, QueryContext,
    QueryOutcome,
};

// 使用 mimalloc 作为全局内存分配器
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Initialize logging system
fn init_logging(args: &CliArgs) {
    // Get log level from environment variable, or set based on debug parameter
    let filter = if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else if args.debug {
        EnvFilter::new("qserv_client=debug,qserv_cli=debug,warn")
    } else {
        EnvFilter::new("qserv_client=warn,qserv_cli=info")
    };

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();

    if args.debug {
        debug!("Debug logging level enabled");
    }
}

async fn run(args: CliArgs) -> Result<bool> {
    let config = args.load_config()?;
    let factory = HttpPostFactory::from_current(&config)?;
    let shared = config.shared();

    let ctx = QueryContext::new(Arc::clone(&shared), Arc::new(factory))
        .with_platform(PlatformInfo::detect(args.headless));

    let mut client = QueryClient::new(&ctx);
    for field in &args.fields {
        client.add_field_fmt(format_args!("{}\n", field));
    }
    for raw in &args.raw {
        client.add_field_raw(raw.as_bytes());
    }
    client.send();
    client.wait(Duration::from_millis(args.poll_interval)).await;

    let config = shared.read().unwrap_or_else(PoisonError::into_inner).clone();
    if args.save && client.redirects() > 0 {
        // 命令行覆盖只对本次运行生效，不写回文件
        ClientConfig::persist_game_server_address(&args.config, &config.game_server_address)?;
        info!(
            config_path = ?args.config,
            game_server_address = %config.game_server_address,
            "Configuration updated after redirect"
        );
    }

    let server = ResolvedTarget::from_config(&config).server.full();
    let outcome = QueryOutcome::new(&client, server);
    if args.json {
        println!("{}", outcome.to_json()?);
    } else {
        print_outcome(&outcome);
    }

    Ok(client.status().is_some())
}

#[tokio::main]
async fn main() {
    // 解析命令行参数
    let args = CliArgs::parse();

    // 初始化全局颜色控制
    colored::control::set_override(!args.no_color);

    // 验证命令行参数
    if let Err(err) = args.validate() {
        print_error(&err);
        exit(1);
    }

    init_logging(&args);

    match run(args).await {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(err) => {
            error!(error = %err, "qserv query failed");
            eprintln!("Error: {}", err);
            exit(1);
        }
    }
}
