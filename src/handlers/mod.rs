// API处理器模块
// 包含所有HTTP请求处理逻辑

pub mod health_handlers;
pub mod notify_handlers;
pub mod receipt_handlers;
pub mod transfer_handlers;

// 重新导出处理器
pub use health_handlers::*;
pub use notify_handlers::*;
pub use receipt_handlers::*;
pub use transfer_handlers::*;

use crate::models::ApiResponse;
use crate::services::ServiceError;
use actix_web::HttpResponse;

/// 服务层错误到HTTP响应的统一映射
///
/// 参数校验→400，记录不存在→404，微信侧失败及其余错误→500。
pub fn error_response(err: &ServiceError) -> HttpResponse {
    match err {
        ServiceError::Validation(msg) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(msg))
        }
        ServiceError::NotFound(msg) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error(msg))
        }
        other => HttpResponse::InternalServerError().json(ApiResponse::<()>::error(&other.to_string())),
    }
}
