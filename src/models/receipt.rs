// 电子回单数据模型
// 定义转账电子回单相关的数据结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 电子回单模型
///
/// 一张回单由(out_batch_no, out_detail_no)或(batch_id, detail_id)
/// 两种寻址方式之一唯一确定。首次申请/查询时懒创建，之后原地更新，
/// 不保留历史版本。
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TransferReceipt {
    /// 回单唯一标识符
    pub id: Uuid,
    /// 关联的本地批次ID
    pub batch_ref: Option<Uuid>,
    /// 关联的本地明细ID
    pub detail_ref: Option<Uuid>,
    /// 商户批次单号
    pub out_batch_no: Option<String>,
    /// 微信批次单号
    pub batch_id: Option<String>,
    /// 商户明细单号
    pub out_detail_no: Option<String>,
    /// 微信明细单号
    pub detail_id: Option<String>,
    /// 回单类型
    pub receipt_type: Option<String>,
    /// 回单状态
    pub status: TransferReceiptStatus,
    /// 下载地址
    pub download_url: Option<String>,
    /// 文件摘要算法
    pub hash_type: Option<String>,
    /// 文件摘要值
    pub hash_value: Option<String>,
    /// 文件名
    pub file_name: Option<String>,
    /// 文件大小 (字节)
    pub file_size: Option<i64>,
    /// 回单生成时间
    pub generate_time: Option<DateTime<Utc>>,
    /// 下载地址过期时间
    pub expire_time: Option<DateTime<Utc>>,
    /// 申请时间
    pub applied_at: Option<DateTime<Utc>>,
    /// 微信侧原始响应 (审计用)
    pub raw_response: Option<serde_json::Value>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 回单状态枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
pub enum TransferReceiptStatus {
    /// 生成中
    #[sqlx(rename = "GENERATING")]
    #[serde(rename = "GENERATING")]
    Generating,
    /// 可下载
    #[sqlx(rename = "AVAILABLE")]
    #[serde(rename = "AVAILABLE")]
    Available,
    /// 下载地址已过期
    #[sqlx(rename = "EXPIRED")]
    #[serde(rename = "EXPIRED")]
    Expired,
    /// 生成失败
    #[sqlx(rename = "FAILED")]
    #[serde(rename = "FAILED")]
    Failed,
    /// 已下载 (本地状态)
    #[sqlx(rename = "DOWNLOADED")]
    #[serde(rename = "DOWNLOADED")]
    Downloaded,
}

impl TransferReceiptStatus {
    /// 解析微信侧返回的状态字符串，未知值返回None由调用方记录告警
    pub fn from_remote(value: &str) -> Option<Self> {
        match value {
            "GENERATING" => Some(Self::Generating),
            "AVAILABLE" => Some(Self::Available),
            "EXPIRED" => Some(Self::Expired),
            "FAILED" => Some(Self::Failed),
            "DOWNLOADED" => Some(Self::Downloaded),
            _ => None,
        }
    }

    /// 转换为微信侧状态字符串
    pub fn as_remote(&self) -> &'static str {
        match self {
            Self::Generating => "GENERATING",
            Self::Available => "AVAILABLE",
            Self::Expired => "EXPIRED",
            Self::Failed => "FAILED",
            Self::Downloaded => "DOWNLOADED",
        }
    }

    /// 是否可以下载文件
    pub fn is_downloadable(&self) -> bool {
        matches!(self, Self::Available)
    }

    /// 是否需要重新申请 (地址过期或生成失败)
    pub fn needs_reapply(&self) -> bool {
        matches!(self, Self::Expired | Self::Failed)
    }
}

impl Default for TransferReceiptStatus {
    fn default() -> Self {
        TransferReceiptStatus::Generating
    }
}

/// 回单操作请求 (申请/查询/下载共用)
#[derive(Debug, Deserialize)]
pub struct ReceiptRequest {
    /// 商户批次单号
    pub out_batch_no: Option<String>,
    /// 微信批次单号
    pub batch_id: Option<String>,
    /// 商户明细单号
    pub out_detail_no: Option<String>,
    /// 微信明细单号
    pub detail_id: Option<String>,
    /// 回单类型 (可选)
    pub receipt_type: Option<String>,
}

/// 回单查询响应
#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    /// 本地回单ID
    pub receipt_ref: Uuid,
    /// 商户批次单号
    pub out_batch_no: Option<String>,
    /// 微信批次单号
    pub batch_id: Option<String>,
    /// 商户明细单号
    pub out_detail_no: Option<String>,
    /// 微信明细单号
    pub detail_id: Option<String>,
    /// 回单状态
    pub status: TransferReceiptStatus,
    /// 下载地址
    pub download_url: Option<String>,
    /// 文件摘要算法
    pub hash_type: Option<String>,
    /// 文件摘要值
    pub hash_value: Option<String>,
    /// 回单生成时间
    pub generate_time: Option<DateTime<Utc>>,
    /// 下载地址过期时间
    pub expire_time: Option<DateTime<Utc>>,
}

impl TransferReceipt {
    /// 转换为API响应格式
    pub fn to_response(&self) -> ReceiptResponse {
        ReceiptResponse {
            receipt_ref: self.id,
            out_batch_no: self.out_batch_no.clone(),
            batch_id: self.batch_id.clone(),
            out_detail_no: self.out_detail_no.clone(),
            detail_id: self.detail_id.clone(),
            status: self.status,
            download_url: self.download_url.clone(),
            hash_type: self.hash_type.clone(),
            hash_value: self.hash_value.clone(),
            generate_time: self.generate_time,
            expire_time: self.expire_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_available_is_downloadable() {
        assert!(TransferReceiptStatus::Available.is_downloadable());
        assert!(!TransferReceiptStatus::Generating.is_downloadable());
        assert!(!TransferReceiptStatus::Expired.is_downloadable());
        assert!(!TransferReceiptStatus::Failed.is_downloadable());
        assert!(!TransferReceiptStatus::Downloaded.is_downloadable());
    }

    #[test]
    fn test_needs_reapply_only_for_expired_and_failed() {
        assert!(TransferReceiptStatus::Expired.needs_reapply());
        assert!(TransferReceiptStatus::Failed.needs_reapply());
        assert!(!TransferReceiptStatus::Generating.needs_reapply());
        assert!(!TransferReceiptStatus::Available.needs_reapply());
        assert!(!TransferReceiptStatus::Downloaded.needs_reapply());
    }

    #[test]
    fn test_status_remote_round_trip() {
        for status in [
            TransferReceiptStatus::Generating,
            TransferReceiptStatus::Available,
            TransferReceiptStatus::Expired,
            TransferReceiptStatus::Failed,
            TransferReceiptStatus::Downloaded,
        ] {
            assert_eq!(TransferReceiptStatus::from_remote(status.as_remote()), Some(status));
        }
        assert_eq!(TransferReceiptStatus::from_remote("SIGNING"), None);
    }
}
