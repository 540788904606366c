// 电子回单标识
// 统一商户单号与微信单号两种回单寻址方式

use serde_json::{json, Value};

/// 回单寻址标识
///
/// 商户单号模式携带out_batch_no(+可选out_detail_no)，
/// 微信单号模式携带batch_id(+可选detail_id)，二者互斥。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptIdentifier {
    /// 商户单号模式
    OutBatchNo {
        batch_no: String,
        detail_no: Option<String>,
    },
    /// 微信单号模式
    BatchId {
        batch_id: String,
        detail_id: Option<String>,
    },
}

impl ReceiptIdentifier {
    /// 从四个可空字段构造标识
    ///
    /// out_batch_no与batch_id都缺失时返回错误；二者同时存在时
    /// 以商户单号为准。
    pub fn from_parts(
        out_batch_no: Option<String>,
        batch_id: Option<String>,
        out_detail_no: Option<String>,
        detail_id: Option<String>,
    ) -> Result<Self, String> {
        match (out_batch_no, batch_id) {
            (Some(batch_no), _) => Ok(Self::OutBatchNo {
                batch_no,
                detail_no: out_detail_no,
            }),
            (None, Some(batch_id)) => Ok(Self::BatchId {
                batch_id,
                detail_id,
            }),
            (None, None) => Err("缺少必填字段 out_batch_no 或 batch_id".to_string()),
        }
    }

    /// 仅用商户批次单号构造
    pub fn for_out_batch_no(batch_no: &str) -> Self {
        Self::OutBatchNo {
            batch_no: batch_no.to_string(),
            detail_no: None,
        }
    }

    /// 仅用微信批次单号构造
    pub fn for_batch_id(batch_id: &str) -> Self {
        Self::BatchId {
            batch_id: batch_id.to_string(),
            detail_id: None,
        }
    }

    /// 构建申请回单的请求体，仅输出非空字段
    pub fn request_body(&self) -> Value {
        let mut body = serde_json::Map::new();
        match self {
            Self::OutBatchNo { batch_no, detail_no } => {
                body.insert("out_batch_no".to_string(), json!(batch_no));
                if let Some(detail_no) = detail_no {
                    body.insert("out_detail_no".to_string(), json!(detail_no));
                }
            }
            Self::BatchId { batch_id, detail_id } => {
                body.insert("batch_id".to_string(), json!(batch_id));
                if let Some(detail_id) = detail_id {
                    body.insert("detail_id".to_string(), json!(detail_id));
                }
            }
        }
        Value::Object(body)
    }

    /// 申请回单的接口路径 (两种模式使用不同端点)
    pub fn apply_path(&self) -> &'static str {
        match self {
            Self::OutBatchNo { .. } => "/v3/fund-app/mch-transfer/elecsign/out-bill-no",
            Self::BatchId { .. } => "/v3/fund-app/mch-transfer/elecsign/transfer-bill-no",
        }
    }

    /// 查询回单的接口路径
    pub fn query_path(&self) -> String {
        match self {
            Self::OutBatchNo { batch_no, detail_no } => {
                let mut path =
                    format!("/v3/fund-app/mch-transfer/elecsign/out-bill-no/{}", batch_no);
                if let Some(detail_no) = detail_no {
                    path.push_str(&format!("/details/{}", detail_no));
                }
                path
            }
            Self::BatchId { batch_id, detail_id } => {
                let mut path = format!(
                    "/v3/fund-app/mch-transfer/elecsign/transfer-bill-no/{}",
                    batch_id
                );
                if let Some(detail_id) = detail_id {
                    path.push_str(&format!("/details/{}", detail_id));
                }
                path
            }
        }
    }

    /// 结构化日志上下文，与请求体输出相同的字段子集
    pub fn log_context(&self) -> Value {
        self.request_body()
    }

    /// 商户批次单号 (商户模式)
    pub fn out_batch_no(&self) -> Option<&str> {
        match self {
            Self::OutBatchNo { batch_no, .. } => Some(batch_no),
            Self::BatchId { .. } => None,
        }
    }

    /// 微信批次单号 (微信模式)
    pub fn batch_id(&self) -> Option<&str> {
        match self {
            Self::OutBatchNo { .. } => None,
            Self::BatchId { batch_id, .. } => Some(batch_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_requires_one_batch_identifier() {
        let result = ReceiptIdentifier::from_parts(None, None, Some("D001".to_string()), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_parts_prefers_merchant_identifiers() {
        let id = ReceiptIdentifier::from_parts(
            Some("B001".to_string()),
            Some("1030000071100999991182020050700019480001".to_string()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(id.out_batch_no(), Some("B001"));
        assert_eq!(id.batch_id(), None);
    }

    #[test]
    fn test_request_body_out_batch_no_only() {
        let body = ReceiptIdentifier::for_out_batch_no("X").request_body();
        assert_eq!(body, serde_json::json!({"out_batch_no": "X"}));
        // 不得输出其他键
        assert_eq!(body.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_request_body_with_detail() {
        let id = ReceiptIdentifier::OutBatchNo {
            batch_no: "B001".to_string(),
            detail_no: Some("D001".to_string()),
        };
        assert_eq!(
            id.request_body(),
            serde_json::json!({"out_batch_no": "B001", "out_detail_no": "D001"})
        );

        let id = ReceiptIdentifier::BatchId {
            batch_id: "WX001".to_string(),
            detail_id: Some("WXD001".to_string()),
        };
        assert_eq!(
            id.request_body(),
            serde_json::json!({"batch_id": "WX001", "detail_id": "WXD001"})
        );
    }

    #[test]
    fn test_query_path_per_mode() {
        assert_eq!(
            ReceiptIdentifier::for_out_batch_no("B001").query_path(),
            "/v3/fund-app/mch-transfer/elecsign/out-bill-no/B001"
        );
        assert_eq!(
            ReceiptIdentifier::for_batch_id("WX001").query_path(),
            "/v3/fund-app/mch-transfer/elecsign/transfer-bill-no/WX001"
        );

        let id = ReceiptIdentifier::OutBatchNo {
            batch_no: "B001".to_string(),
            detail_no: Some("D001".to_string()),
        };
        assert_eq!(
            id.query_path(),
            "/v3/fund-app/mch-transfer/elecsign/out-bill-no/B001/details/D001"
        );
    }

    #[test]
    fn test_log_context_matches_request_body() {
        let id = ReceiptIdentifier::for_batch_id("WX001");
        assert_eq!(id.log_context(), id.request_body());
    }
}
