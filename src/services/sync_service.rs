// 状态同步服务
// 轮询微信侧状态并对账本地批次、明细与回单记录

use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

use crate::models::{
    TransferBatch, TransferBatchStatus, TransferDetail, TransferDetailStatus, TransferReceipt,
    TransferReceiptStatus,
};
use crate::services::{ReceiptService, ServiceError};
use crate::wechat::{ReceiptIdentifier, WechatPayClient};

/// 检测到的状态迁移
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    /// 本地状态
    pub from: String,
    /// 远端状态
    pub to: String,
    /// 是否由强制更新触发
    pub forced: bool,
}

/// 判定是否需要记录一次状态迁移
///
/// 本地与远端一致且未强制更新时返回None；同一输入重复调用结果
/// 相同，因此远端无变化时连续两轮同步第二轮检出为零。
pub fn plan_transition(local: &str, remote: &str, force: bool) -> Option<StatusTransition> {
    if local == remote && !force {
        return None;
    }

    Some(StatusTransition {
        from: local.to_string(),
        to: remote.to_string(),
        forced: local == remote,
    })
}

/// 单轮同步执行结果
#[derive(Debug, Default, serde::Serialize)]
pub struct SyncReport {
    /// 扫描的记录数
    pub scanned: u32,
    /// 检出的状态迁移数
    pub transitions: u32,
    /// 处理失败的记录数 (逐条失败不中断)
    pub failures: u32,
    /// 自动下载的回单数
    pub downloaded: u32,
}

/// 状态同步服务
pub struct SyncService {
    pool: PgPool,
    client: Arc<WechatPayClient>,
    receipt_service: ReceiptService,
    item_delay_ms: u64,
    persist_batch_status: bool,
}

impl SyncService {
    /// 创建新的同步服务实例
    pub fn new(
        pool: PgPool,
        client: Arc<WechatPayClient>,
        item_delay_ms: u64,
        persist_batch_status: bool,
    ) -> Self {
        let receipt_service = ReceiptService::new(pool.clone(), client.clone(), item_delay_ms);
        Self {
            pool,
            client,
            receipt_service,
            item_delay_ms,
            persist_batch_status,
        }
    }

    /// 同步批次状态
    ///
    /// 对过滤状态内的每个批次调用不带明细展开的查询接口，比较
    /// 状态串并记录迁移。默认仅观测不回写，persist_batch_status
    /// 开启时才更新本地记录。逐条失败记日志后继续。
    pub async fn sync_batches(
        &self,
        statuses: &[TransferBatchStatus],
        limit: u32,
        force: bool,
    ) -> Result<SyncReport, ServiceError> {
        let status_strings: Vec<String> =
            statuses.iter().map(|s| s.as_remote().to_string()).collect();

        let batches = sqlx::query_as::<_, TransferBatch>(
            r#"
            SELECT * FROM wechat_payment_transfer_batch
            WHERE status = ANY($1)
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(&status_strings)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut report = SyncReport {
            scanned: batches.len() as u32,
            ..Default::default()
        };

        for batch in batches {
            if let Err(e) = self.sync_one_batch(&batch, force, &mut report).await {
                report.failures += 1;
                log::error!(
                    "Failed to sync batch out_batch_no={}: {}",
                    batch.out_batch_no,
                    e
                );
            }

            sleep(Duration::from_millis(self.item_delay_ms)).await;
        }

        Ok(report)
    }

    /// 同步单个批次
    async fn sync_one_batch(
        &self,
        batch: &TransferBatch,
        force: bool,
        report: &mut SyncReport,
    ) -> Result<(), ServiceError> {
        let path = format!(
            "/v3/transfer/batches/out-batch-no/{}?need_query_detail=false&offset=0&limit=100",
            batch.out_batch_no
        );
        let response = self.client.get_json(&path).await?;

        let Some(remote_status) = batch_status_of(&response) else {
            log::warn!("Query response for batch {} has no status field", batch.out_batch_no);
            return Ok(());
        };

        let Some(transition) = plan_transition(batch.status.as_remote(), remote_status, force)
        else {
            return Ok(());
        };

        report.transitions += 1;
        log::info!(
            "Batch {} status transition {} -> {}{}",
            batch.out_batch_no,
            transition.from,
            transition.to,
            if transition.forced { " (forced)" } else { "" }
        );

        if !self.persist_batch_status {
            return Ok(());
        }

        match TransferBatchStatus::from_remote(remote_status) {
            Some(status) => {
                sqlx::query(
                    "UPDATE wechat_payment_transfer_batch SET status = $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(status.as_remote())
                .bind(batch.id)
                .execute(&self.pool)
                .await?;
            }
            None => log::warn!(
                "Unknown remote batch status '{}' for batch {}, not persisting",
                remote_status,
                batch.out_batch_no
            ),
        }

        Ok(())
    }

    /// 同步明细状态
    ///
    /// 选取未终结的明细 (父批次须处于可同步状态)，带明细展开查询
    /// 所属批次，在返回的transfer_detail_list中匹配out_detail_no
    /// 并回写状态变化。
    pub async fn sync_details(&self, limit: u32) -> Result<SyncReport, ServiceError> {
        let details = sqlx::query_as::<_, TransferDetail>(
            r#"
            SELECT d.* FROM wechat_payment_transfer_detail d
            JOIN wechat_payment_transfer_batch b ON b.id = d.batch_ref
            WHERE d.status IN ('INIT', 'WAIT_PAY', 'PROCESSING')
              AND b.status IN ('PROCESSING', 'FINISHED')
            ORDER BY d.created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut report = SyncReport {
            scanned: details.len() as u32,
            ..Default::default()
        };

        for detail in details {
            if let Err(e) = self.sync_one_detail(&detail, &mut report).await {
                report.failures += 1;
                log::error!(
                    "Failed to sync detail out_detail_no={}: {}",
                    detail.out_detail_no,
                    e
                );
            }

            sleep(Duration::from_millis(self.item_delay_ms)).await;
        }

        Ok(report)
    }

    /// 同步单条明细
    async fn sync_one_detail(
        &self,
        detail: &TransferDetail,
        report: &mut SyncReport,
    ) -> Result<(), ServiceError> {
        let batch = sqlx::query_as::<_, TransferBatch>(
            "SELECT * FROM wechat_payment_transfer_batch WHERE id = $1",
        )
        .bind(detail.batch_ref)
        .fetch_one(&self.pool)
        .await?;

        let Some(entry) = self
            .fetch_detail_entry(&batch.out_batch_no, &detail.out_detail_no)
            .await?
        else {
            log::warn!(
                "Detail {} not present in remote detail list of batch {}",
                detail.out_detail_no,
                batch.out_batch_no
            );
            return Ok(());
        };

        let Some(remote_status) = entry.get("detail_status").and_then(Value::as_str) else {
            return Ok(());
        };

        let Some(transition) = plan_transition(detail.status.as_remote(), remote_status, false)
        else {
            return Ok(());
        };

        let Some(new_status) = TransferDetailStatus::from_remote(remote_status) else {
            log::warn!(
                "Unknown remote detail status '{}' for detail {}, keeping local value",
                remote_status,
                detail.out_detail_no
            );
            return Ok(());
        };

        let detail_id = entry.get("detail_id").and_then(Value::as_str);

        sqlx::query(
            r#"
            UPDATE wechat_payment_transfer_detail
            SET status = $1, detail_id = COALESCE(detail_id, $2), updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(new_status.as_remote())
        .bind(detail_id)
        .bind(detail.id)
        .execute(&self.pool)
        .await?;

        report.transitions += 1;
        log::info!(
            "Detail {} status transition {} -> {}",
            detail.out_detail_no,
            transition.from,
            transition.to
        );

        Ok(())
    }

    /// 分页拉取批次明细列表并查找指定商户明细单号
    ///
    /// 单页最多返回100条，批次上限1000笔明细，命中即停，
    /// 末页 (未满页) 仍未命中时返回None。
    async fn fetch_detail_entry(
        &self,
        out_batch_no: &str,
        out_detail_no: &str,
    ) -> Result<Option<Value>, ServiceError> {
        let mut offset: u32 = 0;

        loop {
            let path = format!(
                "/v3/transfer/batches/out-batch-no/{}?need_query_detail=true&offset={}&limit={}",
                out_batch_no, offset, DETAIL_PAGE_SIZE
            );
            let response = self.client.get_json(&path).await?;

            if let Some(entry) = find_detail_entry(&response, out_detail_no) {
                return Ok(Some(entry.clone()));
            }

            let listed = response
                .get("transfer_detail_list")
                .and_then(Value::as_array)
                .map(|list| list.len())
                .unwrap_or(0);

            match next_page_offset(listed, offset) {
                Some(next) => offset = next,
                None => return Ok(None),
            }
        }
    }

    /// 同步回单状态
    ///
    /// 按回单记录携带的标识模式选择查询端点；状态变化时回写，
    /// 新状态为AVAILABLE且开启自动下载时顺带拉取文件。
    pub async fn sync_receipts(
        &self,
        statuses: &[TransferReceiptStatus],
        limit: u32,
        force: bool,
        auto_download: bool,
    ) -> Result<SyncReport, ServiceError> {
        let status_strings: Vec<String> =
            statuses.iter().map(|s| s.as_remote().to_string()).collect();

        let receipts = sqlx::query_as::<_, TransferReceipt>(
            r#"
            SELECT * FROM wechat_payment_transfer_receipt
            WHERE status = ANY($1)
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(&status_strings)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut report = SyncReport {
            scanned: receipts.len() as u32,
            ..Default::default()
        };

        for receipt in receipts {
            if let Err(e) = self
                .sync_one_receipt(&receipt, force, auto_download, &mut report)
                .await
            {
                report.failures += 1;
                log::error!(
                    "Failed to sync receipt id={}, out_batch_no={:?}, batch_id={:?}: {}",
                    receipt.id,
                    receipt.out_batch_no,
                    receipt.batch_id,
                    e
                );
            }

            sleep(Duration::from_millis(self.item_delay_ms)).await;
        }

        Ok(report)
    }

    /// 同步单张回单
    async fn sync_one_receipt(
        &self,
        receipt: &TransferReceipt,
        force: bool,
        auto_download: bool,
        report: &mut SyncReport,
    ) -> Result<(), ServiceError> {
        let identifier = ReceiptIdentifier::from_parts(
            receipt.out_batch_no.clone(),
            receipt.batch_id.clone(),
            receipt.out_detail_no.clone(),
            receipt.detail_id.clone(),
        )
        .map_err(ServiceError::Validation)?;

        let before = receipt.status;
        let updated = self.receipt_service.query(&identifier).await?;

        if let Some(transition) =
            plan_transition(before.as_remote(), updated.status.as_remote(), force)
        {
            report.transitions += 1;
            log::info!(
                "Receipt status transition {} -> {}{}, context={}",
                transition.from,
                transition.to,
                if transition.forced { " (forced)" } else { "" },
                identifier.log_context()
            );
        }

        if auto_download && updated.status.is_downloadable() {
            self.receipt_service.download(&identifier).await?;
            report.downloaded += 1;
        }

        Ok(())
    }
}

/// 明细查询的单页条数上限
const DETAIL_PAGE_SIZE: usize = 100;

/// 单个批次的明细笔数上限，翻页不会越过该边界
const MAX_DETAILS_PER_BATCH: usize = 1000;

/// 当前页满载时给出下一页偏移
///
/// 未满页说明已到末页；偏移到达批次明细上限时同样停止。
fn next_page_offset(listed: usize, offset: u32) -> Option<u32> {
    if listed < DETAIL_PAGE_SIZE {
        return None;
    }

    let next = offset as usize + DETAIL_PAGE_SIZE;
    if next >= MAX_DETAILS_PER_BATCH {
        return None;
    }

    Some(next as u32)
}

/// 从查询响应中取批次状态，兼容包装与平铺两种格式
fn batch_status_of(response: &Value) -> Option<&str> {
    response
        .pointer("/transfer_batch/batch_status")
        .or_else(|| response.get("batch_status"))
        .and_then(Value::as_str)
}

/// 在transfer_detail_list中查找指定商户明细单号的条目
fn find_detail_entry<'a>(response: &'a Value, out_detail_no: &str) -> Option<&'a Value> {
    response
        .get("transfer_detail_list")
        .and_then(Value::as_array)?
        .iter()
        .find(|entry| {
            entry.get("out_detail_no").and_then(Value::as_str) == Some(out_detail_no)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_transition_detects_change() {
        let transition = plan_transition("PROCESSING", "FINISHED", false).unwrap();
        assert_eq!(transition.from, "PROCESSING");
        assert_eq!(transition.to, "FINISHED");
        assert!(!transition.forced);
    }

    #[test]
    fn test_plan_transition_idempotent_when_unchanged() {
        // 第一轮同步检出迁移并回写本地 (persist_batch_status开启)，
        // 远端无变化时第二轮以回写后的状态比较，检出为零
        assert!(plan_transition("PROCESSING", "FINISHED", false).is_some());
        assert!(plan_transition("FINISHED", "FINISHED", false).is_none());
        assert!(plan_transition("FINISHED", "FINISHED", false).is_none());
    }

    #[test]
    fn test_plan_transition_redetected_without_persistence() {
        // 仅观测不回写时本地状态不变，同一迁移每轮都会再次检出
        assert!(plan_transition("PROCESSING", "FINISHED", false).is_some());
        assert!(plan_transition("PROCESSING", "FINISHED", false).is_some());
    }

    #[test]
    fn test_plan_transition_force_flag() {
        let transition = plan_transition("FINISHED", "FINISHED", true).unwrap();
        assert!(transition.forced);

        // 强制更新但状态确有不同时不算forced
        let transition = plan_transition("PROCESSING", "FINISHED", true).unwrap();
        assert!(!transition.forced);
    }

    #[test]
    fn test_batch_status_of_supports_both_shapes() {
        let wrapped = json!({"transfer_batch": {"batch_status": "FINISHED"}});
        assert_eq!(batch_status_of(&wrapped), Some("FINISHED"));

        let flat = json!({"batch_status": "PROCESSING"});
        assert_eq!(batch_status_of(&flat), Some("PROCESSING"));

        assert_eq!(batch_status_of(&json!({})), None);
    }

    #[test]
    fn test_next_page_offset_advances_on_full_page() {
        assert_eq!(next_page_offset(100, 0), Some(100));
        assert_eq!(next_page_offset(100, 800), Some(900));
    }

    #[test]
    fn test_next_page_offset_stops_on_short_page() {
        assert_eq!(next_page_offset(40, 0), None);
        assert_eq!(next_page_offset(0, 100), None);
    }

    #[test]
    fn test_next_page_offset_stops_at_detail_cap() {
        // 批次上限1000笔，偏移900的满页已是最后一页
        assert_eq!(next_page_offset(100, 900), None);
    }

    #[test]
    fn test_find_detail_entry_matches_out_detail_no() {
        let response = json!({
            "transfer_detail_list": [
                {"out_detail_no": "D001", "detail_status": "SUCCESS"},
                {"out_detail_no": "D002", "detail_status": "PROCESSING"},
            ]
        });

        let entry = find_detail_entry(&response, "D002").unwrap();
        assert_eq!(entry["detail_status"], "PROCESSING");

        assert!(find_detail_entry(&response, "D999").is_none());
        assert!(find_detail_entry(&json!({}), "D001").is_none());
    }
}
