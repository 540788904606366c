// 应用状态管理
// 包含数据库连接池、配置信息、微信支付客户端等全局状态

use crate::config::Config;
use crate::wechat::{MerchantCredential, WechatPayClient};
use sqlx::PgPool;
use std::sync::Arc;

/// 应用全局状态
pub struct AppState {
    /// 数据库连接池
    pub db_pool: PgPool,
    /// 应用配置
    pub config: Config,
    /// 微信支付客户端
    pub wechat_client: Arc<WechatPayClient>,
}

impl AppState {
    /// 创建新的应用状态实例
    pub fn new(db_pool: PgPool, config: Config) -> Self {
        let credential = MerchantCredential {
            mchid: config.wechat.mchid.clone(),
            serial_no: config.wechat.serial_no.clone(),
            private_key: config.wechat.private_key.clone(),
        };
        let wechat_client = Arc::new(WechatPayClient::new(
            config.wechat.api_base_url.clone(),
            credential,
            config.wechat.timeout,
        ));

        Self {
            db_pool,
            config,
            wechat_client,
        }
    }
}
