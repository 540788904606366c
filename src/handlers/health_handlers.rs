// 系统状态处理器
// 提供健康检查接口

use actix_web::{web, HttpResponse, Result as ActixResult};
use serde_json::json;

use crate::models::ApiResponse;
use crate::state::AppState;

/// 健康检查
///
/// GET /health
///
/// 附带检查数据库连通性。
pub async fn health_check(data: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let database_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&data.db_pool)
        .await
        .is_ok();

    let body = json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "database": if database_ok { "up" } else { "down" },
    });

    if database_ok {
        Ok(HttpResponse::Ok().json(ApiResponse::success(body)))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(ApiResponse::success_with_message(body, "数据库不可用")))
    }
}
