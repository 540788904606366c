// 商家转账数据模型定义
// 包含转账批次、转账明细、电子回单等核心数据结构

mod batch;
mod detail;
mod receipt;

// 重新导出核心类型
pub use batch::*;
pub use detail::*;
pub use receipt::*;

use serde::Serialize;

/// 标准API响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 是否成功
    pub success: bool,
    /// 提示消息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// 响应数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    /// 创建带消息的成功响应
    pub fn success_with_message(data: T, message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            data: Some(data),
            error: None,
        }
    }

    /// 创建错误响应
    pub fn error(error: &str) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            message: None,
            data: None,
            error: Some(error.to_string()),
        }
    }
}
