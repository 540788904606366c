// 转账明细数据模型
// 定义批次内单笔转账相关的数据结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// 转账明细模型
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct TransferDetail {
    /// 明细唯一标识符
    pub id: Uuid,
    /// 所属批次ID
    pub batch_ref: Uuid,
    /// 商户明细单号 (批次内唯一)
    pub out_detail_no: String,
    /// 转账金额 (分)
    pub transfer_amount: i64,
    /// 转账备注
    pub transfer_remark: String,
    /// 收款用户openid
    pub openid: String,
    /// 收款用户姓名
    pub user_name: Option<String>,
    /// 微信明细单号
    pub detail_id: Option<String>,
    /// 明细状态
    pub status: TransferDetailStatus,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 明细状态枚举
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "varchar")]
pub enum TransferDetailStatus {
    /// 初始态，未提交
    #[sqlx(rename = "INIT")]
    #[serde(rename = "INIT")]
    Init,
    /// 待确认
    #[sqlx(rename = "WAIT_PAY")]
    #[serde(rename = "WAIT_PAY")]
    WaitPay,
    /// 转账中
    #[sqlx(rename = "PROCESSING")]
    #[serde(rename = "PROCESSING")]
    Processing,
    /// 转账成功
    #[sqlx(rename = "SUCCESS")]
    #[serde(rename = "SUCCESS")]
    Success,
    /// 转账失败
    #[sqlx(rename = "FAIL")]
    #[serde(rename = "FAIL")]
    Fail,
}

impl TransferDetailStatus {
    /// 解析微信侧返回的状态字符串，未知值返回None由调用方记录告警
    pub fn from_remote(value: &str) -> Option<Self> {
        match value {
            "INIT" => Some(Self::Init),
            "WAIT_PAY" => Some(Self::WaitPay),
            "PROCESSING" => Some(Self::Processing),
            "SUCCESS" => Some(Self::Success),
            "FAIL" => Some(Self::Fail),
            _ => None,
        }
    }

    /// 转换为微信侧状态字符串
    pub fn as_remote(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::WaitPay => "WAIT_PAY",
            Self::Processing => "PROCESSING",
            Self::Success => "SUCCESS",
            Self::Fail => "FAIL",
        }
    }

    /// 是否为未终结状态 (需要轮询更新)
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Init | Self::WaitPay | Self::Processing)
    }
}

impl Default for TransferDetailStatus {
    fn default() -> Self {
        TransferDetailStatus::Init
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_remote_round_trip() {
        for status in [
            TransferDetailStatus::Init,
            TransferDetailStatus::WaitPay,
            TransferDetailStatus::Processing,
            TransferDetailStatus::Success,
            TransferDetailStatus::Fail,
        ] {
            assert_eq!(TransferDetailStatus::from_remote(status.as_remote()), Some(status));
        }
        assert_eq!(TransferDetailStatus::from_remote("REFUNDED"), None);
    }

    #[test]
    fn test_is_pending() {
        assert!(TransferDetailStatus::Init.is_pending());
        assert!(TransferDetailStatus::WaitPay.is_pending());
        assert!(TransferDetailStatus::Processing.is_pending());
        assert!(!TransferDetailStatus::Success.is_pending());
        assert!(!TransferDetailStatus::Fail.is_pending());
    }
}
