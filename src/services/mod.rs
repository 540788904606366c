// 服务层模块
// 包含所有业务逻辑服务

pub mod notify_service;
pub mod receipt_service;
pub mod sync_service;
pub mod transfer_service;

// 重新导出服务
pub use notify_service::NotifyService;
pub use receipt_service::ReceiptService;
pub use sync_service::SyncService;
pub use transfer_service::TransferService;

use crate::wechat::WechatApiError;

/// 服务层错误分类
///
/// 处理器按类别映射HTTP状态码: 参数校验错误→400，记录不存在→404，
/// 微信侧调用失败及其余错误→500。
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// 请求参数校验失败
    #[error("{0}")]
    Validation(String),
    /// 本地记录不存在
    #[error("{0}")]
    NotFound(String),
    /// 微信支付接口调用失败
    #[error(transparent)]
    Remote(#[from] WechatApiError),
    /// 数据库操作失败
    #[error("数据库操作失败: {0}")]
    Database(#[from] sqlx::Error),
    /// 其他内部错误
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
