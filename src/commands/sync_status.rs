// sync-status命令
// 轮询微信侧批次/明细状态并对账本地记录

use anyhow::{Context, Result};
use clap::Args;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::models::TransferBatchStatus;
use crate::services::SyncService;
use crate::wechat::WechatPayClient;

/// 批次/明细状态同步参数
#[derive(Debug, Args)]
pub struct SyncStatusArgs {
    /// 批次状态过滤 (可多次指定，默认PROCESSING与FINISHED)
    #[arg(long = "status")]
    pub statuses: Vec<String>,
    /// 单轮处理的记录数上限
    #[arg(long, default_value_t = 100)]
    pub limit: u32,
    /// 状态相同时也记录一次迁移
    #[arg(long)]
    pub force: bool,
    /// 批次状态回写本地 (覆盖配置项)
    #[arg(long)]
    pub persist_batch_status: bool,
}

/// 执行批次与明细状态同步
///
/// 逐条失败不影响整轮执行，返回Err仅表示外层任务失败。
pub async fn run(pool: PgPool, config: &Config, args: SyncStatusArgs) -> Result<()> {
    let statuses = parse_statuses(&args.statuses)?;

    let client = Arc::new(wechat_client(config));
    let service = SyncService::new(
        pool,
        client,
        config.sync.item_delay_ms,
        config.sync.persist_batch_status || args.persist_batch_status,
    );

    let batch_report = service
        .sync_batches(&statuses, args.limit, args.force)
        .await
        .context("Batch status sync failed")?;

    log::info!(
        "Batch sync done: scanned={}, transitions={}, failures={}",
        batch_report.scanned,
        batch_report.transitions,
        batch_report.failures
    );

    let detail_report = service
        .sync_details(args.limit)
        .await
        .context("Detail status sync failed")?;

    log::info!(
        "Detail sync done: scanned={}, transitions={}, failures={}",
        detail_report.scanned,
        detail_report.transitions,
        detail_report.failures
    );

    Ok(())
}

/// 解析命令行状态过滤，缺省为PROCESSING+FINISHED
fn parse_statuses(values: &[String]) -> Result<Vec<TransferBatchStatus>> {
    if values.is_empty() {
        return Ok(vec![
            TransferBatchStatus::Processing,
            TransferBatchStatus::Finished,
        ]);
    }

    values
        .iter()
        .map(|value| {
            TransferBatchStatus::from_remote(value)
                .with_context(|| format!("Unknown batch status filter: {}", value))
        })
        .collect()
}

/// 根据配置构造微信客户端
pub(crate) fn wechat_client(config: &Config) -> WechatPayClient {
    WechatPayClient::new(
        config.wechat.api_base_url.clone(),
        crate::wechat::MerchantCredential {
            mchid: config.wechat.mchid.clone(),
            serial_no: config.wechat.serial_no.clone(),
            private_key: config.wechat.private_key.clone(),
        },
        config.wechat.timeout,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statuses_default() {
        let statuses = parse_statuses(&[]).unwrap();
        assert_eq!(
            statuses,
            vec![TransferBatchStatus::Processing, TransferBatchStatus::Finished]
        );
    }

    #[test]
    fn test_parse_statuses_explicit() {
        let statuses = parse_statuses(&["CLOSED".to_string()]).unwrap();
        assert_eq!(statuses, vec![TransferBatchStatus::Closed]);
    }

    #[test]
    fn test_parse_statuses_rejects_unknown() {
        assert!(parse_statuses(&["BOGUS".to_string()]).is_err());
    }
}
