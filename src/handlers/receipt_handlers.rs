// 电子回单API处理器
// 处理回单申请、查询、下载与批量申请等HTTP请求

use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;

use crate::handlers::error_response;
use crate::models::{ApiResponse, ReceiptRequest};
use crate::services::{ReceiptService, ServiceError};
use crate::state::AppState;
use crate::wechat::ReceiptIdentifier;

/// 批量申请回单请求
#[derive(Debug, Deserialize)]
pub struct BatchApplyRequest {
    /// 单次处理的批次数上限
    pub limit: Option<u32>,
    /// 试运行 (只统计不实际申请)
    pub dry_run: Option<bool>,
}

fn receipt_service(data: &web::Data<AppState>) -> ReceiptService {
    ReceiptService::new(
        data.db_pool.clone(),
        data.wechat_client.clone(),
        data.config.sync.item_delay_ms,
    )
}

fn identifier_of(request: &ReceiptRequest) -> Result<ReceiptIdentifier, ServiceError> {
    ReceiptIdentifier::from_parts(
        request.out_batch_no.clone(),
        request.batch_id.clone(),
        request.out_detail_no.clone(),
        request.detail_id.clone(),
    )
    .map_err(ServiceError::Validation)
}

/// 申请电子回单
///
/// POST /api/wechat-pay-transfer/receipt/apply
pub async fn apply_receipt(
    data: web::Data<AppState>,
    request: web::Json<ReceiptRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();
    let identifier = match identifier_of(&request) {
        Ok(identifier) => identifier,
        Err(e) => return Ok(error_response(&e)),
    };

    let service = receipt_service(&data);

    match service.apply(&identifier, request.receipt_type.as_deref()).await {
        Ok(receipt) => Ok(HttpResponse::Ok().json(ApiResponse::success(receipt.to_response()))),
        Err(e) => {
            log::error!("Failed to apply receipt, context={}: {}", identifier.log_context(), e);
            Ok(error_response(&e))
        }
    }
}

/// 查询电子回单
///
/// POST /api/wechat-pay-transfer/receipt/query
pub async fn query_receipt(
    data: web::Data<AppState>,
    request: web::Json<ReceiptRequest>,
) -> ActixResult<HttpResponse> {
    let identifier = match identifier_of(&request) {
        Ok(identifier) => identifier,
        Err(e) => return Ok(error_response(&e)),
    };

    let service = receipt_service(&data);

    match service.query(&identifier).await {
        Ok(receipt) => Ok(HttpResponse::Ok().json(ApiResponse::success(receipt.to_response()))),
        Err(e) => {
            log::error!("Failed to query receipt, context={}: {}", identifier.log_context(), e);
            Ok(error_response(&e))
        }
    }
}

/// 下载回单文件
///
/// POST /api/wechat-pay-transfer/receipt/download
///
/// 响应为PDF文件内容，下载成功后本地记录置为DOWNLOADED。
pub async fn download_receipt(
    data: web::Data<AppState>,
    request: web::Json<ReceiptRequest>,
) -> ActixResult<HttpResponse> {
    let identifier = match identifier_of(&request) {
        Ok(identifier) => identifier,
        Err(e) => return Ok(error_response(&e)),
    };

    let service = receipt_service(&data);

    match service.download(&identifier).await {
        Ok((content, receipt)) => {
            let file_name = receipt
                .file_name
                .unwrap_or_else(|| format!("receipt-{}.pdf", receipt.id));

            Ok(HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", file_name),
                ))
                .body(content))
        }
        Err(e) => {
            log::error!("Failed to download receipt, context={}: {}", identifier.log_context(), e);
            Ok(error_response(&e))
        }
    }
}

/// 批量申请回单
///
/// POST /api/wechat-pay-transfer/receipt/batch-apply
///
/// 为已完成且尚无回单的批次逐个发起申请。
pub async fn batch_apply_receipts(
    data: web::Data<AppState>,
    request: web::Json<BatchApplyRequest>,
) -> ActixResult<HttpResponse> {
    let service = receipt_service(&data);
    let limit = request.limit.unwrap_or(50);
    let dry_run = request.dry_run.unwrap_or(false);

    match service.batch_apply(limit, dry_run).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report))),
        Err(e) => {
            log::error!("Failed to batch apply receipts: {}", e);
            Ok(error_response(&e))
        }
    }
}
