mod commands;
mod config;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod utils;
mod wechat;

use crate::config::Config;
use crate::routes::{api_routes, public_routes};
use crate::state::AppState;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::info;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::io::Write;
use tokio::time::Duration;

/// 微信支付商家转账与电子回单服务
#[derive(Debug, Parser)]
#[command(name = "wechat-pay-transfer", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 启动HTTP服务
    Serve,
    /// 同步批次与明细状态
    SyncStatus(commands::sync_status::SyncStatusArgs),
    /// 同步电子回单状态
    SyncReceipts(commands::sync_receipts::SyncReceiptsArgs),
    /// 批量申请电子回单
    BatchApplyReceipts(commands::batch_apply::BatchApplyArgs),
    /// 清理过期的终态记录
    Cleanup(commands::cleanup::CleanupArgs),
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    let mut log_builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    log_builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S %:z"),
                record.level(),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.validate()?;

    let pool = connect_pool(&config).await?;

    // 任一命令失败时以退出码1结束，逐条处理失败不在此列
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await?,
        Command::SyncStatus(args) => commands::sync_status::run(pool, &config, args).await?,
        Command::SyncReceipts(args) => commands::sync_receipts::run(pool, &config, args).await?,
        Command::BatchApplyReceipts(args) => commands::batch_apply::run(pool, &config, args).await?,
        Command::Cleanup(args) => commands::cleanup::run(pool, &config, args).await?,
    }

    Ok(())
}

/// 创建数据库连接池
async fn connect_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
        .connect(&config.database.url)
        .await?;

    Ok(pool)
}

/// 启动HTTP服务
async fn serve(pool: PgPool, config: Config) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(&pool).await?;

    let bind_address = config.bind_address();
    let workers = config.server.workers;
    let app_state = web::Data::new(AppState::new(pool, config));

    info!("Starting wechat-pay-transfer server at {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .service(api_routes())
            .service(public_routes())
    })
    .bind(&bind_address)?;

    if let Some(workers) = workers {
        server = server.workers(workers);
    }

    server.run().await?;
    Ok(())
}
