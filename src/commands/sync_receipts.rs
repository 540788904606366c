// sync-receipts命令
// 轮询微信侧回单状态，支持可下载回单的自动下载

use anyhow::{Context, Result};
use clap::Args;
use sqlx::PgPool;
use std::sync::Arc;

use crate::commands::sync_status::wechat_client;
use crate::config::Config;
use crate::models::TransferReceiptStatus;
use crate::services::SyncService;

/// 回单状态同步参数
#[derive(Debug, Args)]
pub struct SyncReceiptsArgs {
    /// 回单状态过滤 (可多次指定，默认GENERATING与FAILED)
    #[arg(long = "status")]
    pub statuses: Vec<String>,
    /// 单轮处理的记录数上限
    #[arg(long, default_value_t = 100)]
    pub limit: u32,
    /// 状态相同时也记录一次迁移
    #[arg(long)]
    pub force: bool,
    /// 回单变为可下载时自动下载文件
    #[arg(long)]
    pub auto_download: bool,
}

/// 执行回单状态同步
pub async fn run(pool: PgPool, config: &Config, args: SyncReceiptsArgs) -> Result<()> {
    let statuses = parse_statuses(&args.statuses)?;

    let client = Arc::new(wechat_client(config));
    let service = SyncService::new(
        pool,
        client,
        config.sync.item_delay_ms,
        config.sync.persist_batch_status,
    );

    let report = service
        .sync_receipts(&statuses, args.limit, args.force, args.auto_download)
        .await
        .context("Receipt status sync failed")?;

    log::info!(
        "Receipt sync done: scanned={}, transitions={}, downloaded={}, failures={}",
        report.scanned,
        report.transitions,
        report.downloaded,
        report.failures
    );

    Ok(())
}

/// 解析命令行状态过滤，缺省为GENERATING+FAILED
fn parse_statuses(values: &[String]) -> Result<Vec<TransferReceiptStatus>> {
    if values.is_empty() {
        return Ok(vec![
            TransferReceiptStatus::Generating,
            TransferReceiptStatus::Failed,
        ]);
    }

    values
        .iter()
        .map(|value| {
            TransferReceiptStatus::from_remote(value)
                .with_context(|| format!("Unknown receipt status filter: {}", value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statuses_default() {
        let statuses = parse_statuses(&[]).unwrap();
        assert_eq!(
            statuses,
            vec![TransferReceiptStatus::Generating, TransferReceiptStatus::Failed]
        );
    }

    #[test]
    fn test_parse_statuses_explicit() {
        let statuses = parse_statuses(&["AVAILABLE".to_string(), "EXPIRED".to_string()]).unwrap();
        assert_eq!(
            statuses,
            vec![TransferReceiptStatus::Available, TransferReceiptStatus::Expired]
        );
    }

    #[test]
    fn test_parse_statuses_rejects_unknown() {
        assert!(parse_statuses(&["SIGNING".to_string()]).is_err());
    }
}
