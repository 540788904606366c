// 微信支付v3接口客户端模块
// 包含出站HTTP客户端、回单标识、回调报文解密

pub mod client;
pub mod crypto;
pub mod receipt_identifier;

// 重新导出常用类型
pub use client::{MerchantCredential, WechatApiError, WechatPayClient};
pub use receipt_identifier::ReceiptIdentifier;
