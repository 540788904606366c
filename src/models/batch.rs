// 转账批次数据模型
// 定义转账批次相关的数据结构和业务逻辑

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 转账批次模型
///
/// 一个批次最多包含1000笔转账明细，提交前批次总金额/总笔数
/// 必须与明细之和一致。
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TransferBatch {
    /// 批次唯一标识符
    pub id: Uuid,
    /// 商户批次单号 (商户系统内唯一)
    pub out_batch_no: String,
    /// 批次名称
    pub batch_name: String,
    /// 批次备注
    pub batch_remark: Option<String>,
    /// 转账总金额 (分)
    pub total_amount: i64,
    /// 转账总笔数
    pub total_num: i32,
    /// 微信批次单号 (提交成功后由微信分配)
    pub batch_id: Option<String>,
    /// 批次状态
    pub status: TransferBatchStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 批次状态枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
pub enum TransferBatchStatus {
    /// 转账中
    #[sqlx(rename = "PROCESSING")]
    #[serde(rename = "PROCESSING")]
    Processing,
    /// 已完成
    #[sqlx(rename = "FINISHED")]
    #[serde(rename = "FINISHED")]
    Finished,
    /// 已关闭
    #[sqlx(rename = "CLOSED")]
    #[serde(rename = "CLOSED")]
    Closed,
}

impl TransferBatchStatus {
    /// 解析微信侧返回的状态字符串，未知值返回None由调用方记录告警
    pub fn from_remote(value: &str) -> Option<Self> {
        match value {
            "PROCESSING" => Some(Self::Processing),
            "FINISHED" => Some(Self::Finished),
            "CLOSED" => Some(Self::Closed),
            _ => None,
        }
    }

    /// 转换为微信侧状态字符串
    pub fn as_remote(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Finished => "FINISHED",
            Self::Closed => "CLOSED",
        }
    }

    /// 是否为可同步状态 (转账中或已完成的批次需要轮询)
    pub fn is_syncable(&self) -> bool {
        matches!(self, Self::Processing | Self::Finished)
    }
}

impl Default for TransferBatchStatus {
    fn default() -> Self {
        TransferBatchStatus::Processing
    }
}

/// 发起转账请求
#[derive(Debug, Deserialize)]
pub struct InitiateTransferRequest {
    /// 商户批次单号
    pub out_batch_no: String,
    /// 批次名称
    pub batch_name: String,
    /// 批次备注 (可选)
    pub batch_remark: Option<String>,
    /// 转账总金额 (分)
    pub total_amount: i64,
    /// 转账总笔数
    pub total_num: i32,
    /// 转账明细列表
    pub transfer_detail_list: Vec<InitiateTransferDetail>,
}

/// 发起转账的单笔明细
#[derive(Debug, Deserialize)]
pub struct InitiateTransferDetail {
    /// 商户明细单号 (批次内唯一)
    pub out_detail_no: String,
    /// 转账金额 (分)
    pub transfer_amount: i64,
    /// 转账备注
    pub transfer_remark: String,
    /// 收款用户openid
    pub openid: String,
    /// 收款用户姓名 (可选，明文)
    pub user_name: Option<String>,
}

/// 发起转账响应
#[derive(Debug, Serialize)]
pub struct InitiateTransferResponse {
    /// 本地批次ID
    pub batch_ref: Uuid,
    /// 商户批次单号
    pub out_batch_no: String,
    /// 微信批次单号
    pub batch_id: Option<String>,
    /// 批次状态
    pub status: TransferBatchStatus,
}

impl TransferBatch {
    /// 转换为API响应格式
    pub fn to_response(&self) -> InitiateTransferResponse {
        InitiateTransferResponse {
            batch_ref: self.id,
            out_batch_no: self.out_batch_no.clone(),
            batch_id: self.batch_id.clone(),
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_remote_round_trip() {
        for status in [
            TransferBatchStatus::Processing,
            TransferBatchStatus::Finished,
            TransferBatchStatus::Closed,
        ] {
            assert_eq!(TransferBatchStatus::from_remote(status.as_remote()), Some(status));
        }
    }

    #[test]
    fn test_status_from_remote_unknown() {
        // 微信侧新增的未知状态不应导致解析失败
        assert_eq!(TransferBatchStatus::from_remote("SUSPENDED"), None);
        assert_eq!(TransferBatchStatus::from_remote(""), None);
    }

    #[test]
    fn test_is_syncable() {
        assert!(TransferBatchStatus::Processing.is_syncable());
        assert!(TransferBatchStatus::Finished.is_syncable());
        assert!(!TransferBatchStatus::Closed.is_syncable());
    }
}
