// batch-apply-receipts命令
// 为已完成且尚无回单的批次批量申请电子回单

use anyhow::{Context, Result};
use clap::Args;
use sqlx::PgPool;
use std::sync::Arc;

use crate::commands::sync_status::wechat_client;
use crate::config::Config;
use crate::services::ReceiptService;

/// 批量申请回单参数
#[derive(Debug, Args)]
pub struct BatchApplyArgs {
    /// 单轮处理的批次数上限
    #[arg(long, default_value_t = 50)]
    pub limit: u32,
    /// 试运行 (只统计不实际申请)
    #[arg(long)]
    pub dry_run: bool,
}

/// 执行批量申请回单
pub async fn run(pool: PgPool, config: &Config, args: BatchApplyArgs) -> Result<()> {
    let client = Arc::new(wechat_client(config));
    let service = ReceiptService::new(pool, client, config.sync.item_delay_ms);

    let report = service
        .batch_apply(args.limit, args.dry_run)
        .await
        .context("Batch receipt apply failed")?;

    log::info!(
        "Batch apply done: scanned={}, applied={}, failed={}, dry_run={}",
        report.scanned,
        report.applied,
        report.failed,
        report.dry_run
    );

    Ok(())
}
