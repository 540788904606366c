// 回调通知服务
// 处理微信支付的转账结果回调，解密报文并回写本地批次状态

use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;

use crate::models::{TransferBatch, TransferBatchStatus};
use crate::services::ServiceError;
use crate::wechat::crypto::decrypt_resource;

/// 回调通知报文
#[derive(Debug, Deserialize)]
pub struct NotifyPayload {
    /// 通知ID
    pub id: Option<String>,
    /// 事件类型
    pub event_type: String,
    /// 加密的业务资源
    pub resource: NotifyResource,
}

/// 回调resource字段 (AES-256-GCM加密)
#[derive(Debug, Deserialize)]
pub struct NotifyResource {
    /// 加密算法 (AEAD_AES_256_GCM)
    pub algorithm: String,
    /// base64密文
    pub ciphertext: String,
    /// 随机串
    pub nonce: String,
    /// 附加认证数据
    #[serde(default)]
    pub associated_data: String,
    /// 原始资源类型
    pub original_type: Option<String>,
}

/// 回调通知服务
pub struct NotifyService {
    pool: PgPool,
    api_v3_key: String,
}

impl NotifyService {
    /// 创建新的回调通知服务实例
    pub fn new(pool: PgPool, api_v3_key: String) -> Self {
        Self { pool, api_v3_key }
    }

    /// 处理回调通知
    ///
    /// resource解密是必经步骤，解密失败直接报错。解密后的报文
    /// 必须携带out_batch_no；字段缺失或批次不存在返回Ok(false)
    /// 而不是报错，调用方须检查返回值。
    pub async fn handle(&self, payload: &NotifyPayload) -> Result<bool, ServiceError> {
        log::info!(
            "Received transfer notification, id={:?}, event_type={}",
            payload.id,
            payload.event_type
        );

        let plaintext = decrypt_resource(
            &self.api_v3_key,
            &payload.resource.nonce,
            &payload.resource.associated_data,
            &payload.resource.ciphertext,
        )
        .map_err(|e| ServiceError::Validation(format!("回调报文解密失败: {}", e)))?;

        let resource: Value = serde_json::from_str(&plaintext)
            .map_err(|e| ServiceError::Validation(format!("回调报文不是合法JSON: {}", e)))?;

        let Some(out_batch_no) = resource.get("out_batch_no").and_then(Value::as_str) else {
            log::warn!("Notification resource has no out_batch_no, event_type={}", payload.event_type);
            return Ok(false);
        };

        let batch = sqlx::query_as::<_, TransferBatch>(
            "SELECT * FROM wechat_payment_transfer_batch WHERE out_batch_no = $1",
        )
        .bind(out_batch_no)
        .fetch_optional(&self.pool)
        .await?;

        let Some(batch) = batch else {
            log::warn!("Notification for unknown batch out_batch_no={}", out_batch_no);
            return Ok(false);
        };

        if let Some(remote_status) = resource.get("batch_status").and_then(Value::as_str) {
            match TransferBatchStatus::from_remote(remote_status) {
                Some(status) if status != batch.status => {
                    sqlx::query(
                        "UPDATE wechat_payment_transfer_batch SET status = $1, updated_at = NOW() WHERE id = $2",
                    )
                    .bind(status.as_remote())
                    .bind(batch.id)
                    .execute(&self.pool)
                    .await?;

                    log::info!(
                        "Batch {} status {} -> {} (via notification)",
                        out_batch_no,
                        batch.status.as_remote(),
                        remote_status
                    );
                }
                Some(_) => {}
                None => log::warn!(
                    "Unknown batch status '{}' in notification for batch {}",
                    remote_status,
                    out_batch_no
                ),
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_payload_deserialization() {
        let json = r#"{
            "id": "EV-2018022511223320873",
            "event_type": "MCHTRANSFER.BATCH.FINISHED",
            "resource": {
                "algorithm": "AEAD_AES_256_GCM",
                "ciphertext": "...",
                "nonce": "abcdef123456",
                "associated_data": "mch_payment",
                "original_type": "mch_payment"
            }
        }"#;

        let payload: NotifyPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.event_type, "MCHTRANSFER.BATCH.FINISHED");
        assert_eq!(payload.resource.algorithm, "AEAD_AES_256_GCM");
        assert_eq!(payload.resource.nonce, "abcdef123456");
    }

    #[test]
    fn test_notify_payload_associated_data_defaults_empty() {
        let json = r#"{
            "event_type": "MCHTRANSFER.BATCH.CLOSED",
            "resource": {
                "algorithm": "AEAD_AES_256_GCM",
                "ciphertext": "...",
                "nonce": "abcdef123456"
            }
        }"#;

        let payload: NotifyPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.resource.associated_data, "");
        assert!(payload.id.is_none());
    }
}
