// 数据验证工具函数
// 提供输入数据验证和格式检查功能

use anyhow::Result;

/// 验证商户单号格式
///
/// 商户批次/明细单号: 5-32位，仅允许数字、字母、下划线和中划线
pub fn validate_out_no(value: &str) -> bool {
    if value.len() < 5 || value.len() > 32 {
        return false;
    }

    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// 验证URL格式
pub fn validate_url(url: &str) -> bool {
    (url.starts_with("http://") || url.starts_with("https://"))
        && url.len() > 8
        && !url.contains(char::is_whitespace)
}

/// 验证openid格式 (非空且不超过128字符)
pub fn validate_openid(openid: &str) -> bool {
    !openid.is_empty() && openid.len() <= 128
}

/// 验证转账金额 (分)
pub fn validate_transfer_amount(amount: i64) -> Result<()> {
    if amount <= 0 {
        anyhow::bail!("转账金额必须为正数");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_out_no() {
        assert!(validate_out_no("plfk2020042013"));
        assert!(validate_out_no("BATCH_2024-06-01"));
        assert!(!validate_out_no("abc")); // 过短
        assert!(!validate_out_no(&"x".repeat(33))); // 过长
        assert!(!validate_out_no("batch no with space"));
        assert!(!validate_out_no("批次001"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/notify"));
        assert!(validate_url("http://localhost:8080/cb"));
        assert!(!validate_url("ftp://example.com"));
        assert!(!validate_url("https://bad url.com"));
        assert!(!validate_url(""));
    }

    #[test]
    fn test_validate_transfer_amount() {
        assert!(validate_transfer_amount(1).is_ok());
        assert!(validate_transfer_amount(0).is_err());
        assert!(validate_transfer_amount(-100).is_err());
    }

    #[test]
    fn test_validate_openid() {
        assert!(validate_openid("o4GgauInH_RCEdvrrNGrntXDuXXX"));
        assert!(!validate_openid(""));
        assert!(!validate_openid(&"x".repeat(129)));
    }
}
