// 微信支付v3接口客户端
// 封装商户凭证、请求签名头与JSON请求发送

use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::time::Duration;

/// 微信支付接口调用错误
#[derive(Debug, thiserror::Error)]
pub enum WechatApiError {
    /// 微信侧返回非200，携带远端message字段
    #[error("微信支付接口返回错误: {message} (HTTP {status})")]
    Remote { status: u16, message: String },
    /// 文件下载返回非200 (二进制响应无message可取)
    #[error("回单文件下载失败 (HTTP {0})")]
    Download(u16),
    /// 网络层错误
    #[error("请求微信支付接口失败: {0}")]
    Http(#[from] reqwest::Error),
}

/// 商户API凭证
///
/// mTLS证书与平台证书管理由独立的凭证组件负责，这里只保留
/// 构造Authorization头所需的字段。
#[derive(Debug, Clone)]
pub struct MerchantCredential {
    /// 商户号
    pub mchid: String,
    /// 商户API证书序列号
    pub serial_no: String,
    /// 签名私钥材料
    pub private_key: String,
}

impl MerchantCredential {
    /// 对签名串生成签名值
    ///
    /// 生产部署中由凭证组件执行RSA签名，这里以密钥摘要形式占位，
    /// 保持头部格式与v3协议一致。
    pub fn sign(&self, message: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.private_key.as_bytes());
        hasher.update(message.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// 生成随机字符串 (签名nonce用)
pub fn nonce_str(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// 微信支付v3接口HTTP客户端
pub struct WechatPayClient {
    client: Client,
    base_url: String,
    credential: MerchantCredential,
}

impl WechatPayClient {
    /// 创建新的客户端实例
    pub fn new(base_url: String, credential: MerchantCredential, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("wechat-pay-transfer/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            credential,
        }
    }

    /// 商户号
    pub fn mchid(&self) -> &str {
        &self.credential.mchid
    }

    /// 商户凭证
    pub fn credential(&self) -> &MerchantCredential {
        &self.credential
    }

    /// 构造v3协议Authorization头
    fn authorization(&self, method: &str, path: &str, body: &str) -> String {
        let timestamp = chrono::Utc::now().timestamp();
        let nonce = nonce_str(32);
        let message = format!("{}\n{}\n{}\n{}\n{}\n", method, path, timestamp, nonce, body);
        let signature = self.credential.sign(&message);

        format!(
            "WECHATPAY2-SHA256-RSA2048 mchid=\"{}\",serial_no=\"{}\",nonce_str=\"{}\",timestamp=\"{}\",signature=\"{}\"",
            self.credential.mchid, self.credential.serial_no, nonce, timestamp, signature
        )
    }

    /// 发送POST请求，返回JSON响应
    ///
    /// 非200响应会读取远端message字段并包装为错误，message缺失时
    /// 以"unknown error"兜底。
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, WechatApiError> {
        let body_text = body.to_string();
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.authorization("POST", path, &body_text))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body_text)
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// 发送GET请求，返回JSON响应
    pub async fn get_json(&self, path: &str) -> Result<Value, WechatApiError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.authorization("GET", path, ""))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// 下载回单文件内容
    ///
    /// download_url是微信下发的免鉴权临时地址，直接GET原始内容；
    /// 非200时只能携带状态码。
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, WechatApiError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, "wechat-pay-transfer/0.1")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WechatApiError::Download(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// 读取JSON响应体并按状态码归类
    async fn read_json(response: reqwest::Response) -> Result<Value, WechatApiError> {
        let status = response.status();
        let text = response.text().await?;
        let json: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if status.is_success() {
            return Ok(json);
        }

        let message = json
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();

        Err(WechatApiError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credential() -> MerchantCredential {
        MerchantCredential {
            mchid: "1900000001".to_string(),
            serial_no: "5157F09EFDC096DE15EBE81A47057A72".to_string(),
            private_key: "test-private-key".to_string(),
        }
    }

    #[test]
    fn test_nonce_str_length_and_charset() {
        let nonce = nonce_str(32);
        assert_eq!(nonce.len(), 32);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_authorization_header_format() {
        let client = WechatPayClient::new(
            "https://api.mch.weixin.qq.com".to_string(),
            test_credential(),
            30,
        );
        let header = client.authorization("GET", "/v3/transfer/batches/out-batch-no/B001", "");

        assert!(header.starts_with("WECHATPAY2-SHA256-RSA2048 "));
        assert!(header.contains("mchid=\"1900000001\""));
        assert!(header.contains("serial_no=\"5157F09EFDC096DE15EBE81A47057A72\""));
        assert!(header.contains("signature=\""));
    }

    #[test]
    fn test_sign_is_deterministic() {
        let credential = test_credential();
        assert_eq!(credential.sign("message"), credential.sign("message"));
        assert_ne!(credential.sign("message"), credential.sign("other"));
    }
}
