// API路由配置
// 定义所有HTTP接口的路由规则

use crate::handlers::*;
use actix_web::{web, Scope};

/// 商家转账API路由配置
pub fn api_routes() -> Scope {
    web::scope("/api/wechat-pay-transfer")
        // 转账路由
        .service(transfer_routes())
        // 电子回单路由
        .service(receipt_routes())
        // 回调通知路由
        .service(notify_routes())
}

/// 转账路由
fn transfer_routes() -> Scope {
    web::scope("/transfer")
        .route("/initiate", web::post().to(initiate_transfer))
        .route("/cancel", web::post().to(cancel_transfer))
        .route("/query", web::post().to(query_transfer))
        .route("/app-params", web::post().to(app_confirm_params))
        .route("/jsapi-params", web::post().to(jsapi_confirm_params))
}

/// 电子回单路由
fn receipt_routes() -> Scope {
    web::scope("/receipt")
        .route("/apply", web::post().to(apply_receipt))
        .route("/query", web::post().to(query_receipt))
        .route("/download", web::post().to(download_receipt))
        .route("/batch-apply", web::post().to(batch_apply_receipts))
}

/// 回调通知路由
fn notify_routes() -> Scope {
    web::scope("/notify")
        .route("/callback", web::post().to(notify_callback))
        .route("/config", web::get().to(notify_config))
}

/// 公共路由 (无需认证)
pub fn public_routes() -> Scope {
    web::scope("").route("/health", web::get().to(health_check))
}
