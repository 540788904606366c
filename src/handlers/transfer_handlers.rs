// 转账API处理器
// 处理发起、撤销、查询转账及用户确认参数生成等HTTP请求

use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;

use crate::handlers::error_response;
use crate::models::{ApiResponse, InitiateTransferRequest};
use crate::services::TransferService;
use crate::state::AppState;

/// 撤销/查询转账请求
#[derive(Debug, Deserialize)]
pub struct TransferLookupRequest {
    /// 商户批次单号
    pub out_batch_no: Option<String>,
    /// 查询时是否展开明细
    pub need_query_detail: Option<bool>,
}

/// 用户确认参数请求
#[derive(Debug, Deserialize)]
pub struct ConfirmParamsRequest {
    /// 发起转账后微信返回的package信息
    pub package_info: Option<String>,
}

fn transfer_service(data: &web::Data<AppState>) -> TransferService {
    TransferService::new(
        data.db_pool.clone(),
        data.wechat_client.clone(),
        data.config.wechat.app_id.clone(),
    )
}

/// 发起商家转账
///
/// POST /api/wechat-pay-transfer/transfer/initiate
pub async fn initiate_transfer(
    data: web::Data<AppState>,
    request: web::Json<InitiateTransferRequest>,
) -> ActixResult<HttpResponse> {
    let service = transfer_service(&data);

    match service.initiate(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => {
            log::error!("Failed to initiate transfer: {}", e);
            Ok(error_response(&e))
        }
    }
}

/// 撤销转账批次
///
/// POST /api/wechat-pay-transfer/transfer/cancel
///
/// 本地不存在对应批次时仍返回上游撤销结果。
pub async fn cancel_transfer(
    data: web::Data<AppState>,
    request: web::Json<TransferLookupRequest>,
) -> ActixResult<HttpResponse> {
    let Some(out_batch_no) = request.out_batch_no.as_deref() else {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("缺少必填字段 out_batch_no")));
    };

    let service = transfer_service(&data);

    match service.cancel(out_batch_no).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => {
            log::error!("Failed to cancel transfer batch {}: {}", out_batch_no, e);
            Ok(error_response(&e))
        }
    }
}

/// 查询转账批次
///
/// POST /api/wechat-pay-transfer/transfer/query
pub async fn query_transfer(
    data: web::Data<AppState>,
    request: web::Json<TransferLookupRequest>,
) -> ActixResult<HttpResponse> {
    let Some(out_batch_no) = request.out_batch_no.as_deref() else {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("缺少必填字段 out_batch_no")));
    };

    let service = transfer_service(&data);
    let need_query_detail = request.need_query_detail.unwrap_or(false);

    match service.query(out_batch_no, need_query_detail).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => {
            log::error!("Failed to query transfer batch {}: {}", out_batch_no, e);
            Ok(error_response(&e))
        }
    }
}

/// 生成APP用户确认参数
///
/// POST /api/wechat-pay-transfer/transfer/app-params
pub async fn app_confirm_params(
    data: web::Data<AppState>,
    request: web::Json<ConfirmParamsRequest>,
) -> ActixResult<HttpResponse> {
    let Some(package_info) = request.package_info.as_deref() else {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("缺少必填字段 package_info")));
    };

    let service = transfer_service(&data);
    Ok(HttpResponse::Ok().json(ApiResponse::success(service.app_params(package_info))))
}

/// 生成JSAPI用户确认参数
///
/// POST /api/wechat-pay-transfer/transfer/jsapi-params
pub async fn jsapi_confirm_params(
    data: web::Data<AppState>,
    request: web::Json<ConfirmParamsRequest>,
) -> ActixResult<HttpResponse> {
    let Some(package_info) = request.package_info.as_deref() else {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("缺少必填字段 package_info")));
    };

    let service = transfer_service(&data);
    Ok(HttpResponse::Ok().json(ApiResponse::success(service.jsapi_params(package_info))))
}
