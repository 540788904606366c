// 回调报文解密
// 微信支付v3回调resource字段使用APIv3密钥做AES-256-GCM加密

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// 报文解密错误
#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("APIv3密钥长度错误: {0} (应为32字节)")]
    KeyLength(usize),
    #[error("回调nonce长度错误: {0} (应为12字节)")]
    NonceLength(usize),
    #[error("密文base64解码失败: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("回调报文解密失败")]
    Aead,
    #[error("解密结果不是合法UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// 解密回调resource字段
///
/// ciphertext为base64编码的密文+认证标签，associated_data参与
/// GCM认证但不加密。返回解密后的明文JSON字符串。
pub fn decrypt_resource(
    api_v3_key: &str,
    nonce: &str,
    associated_data: &str,
    ciphertext_b64: &str,
) -> Result<String, DecryptError> {
    let key = api_v3_key.as_bytes();
    if key.len() != KEY_LEN {
        return Err(DecryptError::KeyLength(key.len()));
    }
    if nonce.len() != NONCE_LEN {
        return Err(DecryptError::NonceLength(nonce.len()));
    }

    let ciphertext = base64::engine::general_purpose::STANDARD.decode(ciphertext_b64)?;

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| DecryptError::KeyLength(key.len()))?;
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce.as_bytes()),
            Payload {
                msg: &ciphertext,
                aad: associated_data.as_bytes(),
            },
        )
        .map_err(|_| DecryptError::Aead)?;

    Ok(String::from_utf8(plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &str = "0123456789abcdef0123456789abcdef";

    fn encrypt_resource(api_v3_key: &str, nonce: &str, aad: &str, plaintext: &str) -> String {
        let cipher = Aes256Gcm::new_from_slice(api_v3_key.as_bytes()).unwrap();
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(nonce.as_bytes()),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: aad.as_bytes(),
                },
            )
            .unwrap();
        base64::engine::general_purpose::STANDARD.encode(ciphertext)
    }

    #[test]
    fn test_decrypt_round_trip() {
        let plaintext = r#"{"out_batch_no":"B001","batch_status":"FINISHED"}"#;
        let ciphertext = encrypt_resource(TEST_KEY, "abcdef123456", "transfer_batch", plaintext);

        let decrypted =
            decrypt_resource(TEST_KEY, "abcdef123456", "transfer_batch", &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_decrypt_rejects_wrong_aad() {
        let ciphertext = encrypt_resource(TEST_KEY, "abcdef123456", "transfer_batch", "{}");

        let result = decrypt_resource(TEST_KEY, "abcdef123456", "tampered", &ciphertext);
        assert!(matches!(result, Err(DecryptError::Aead)));
    }

    #[test]
    fn test_decrypt_rejects_bad_key_length() {
        let result = decrypt_resource("short-key", "abcdef123456", "", "AAAA");
        assert!(matches!(result, Err(DecryptError::KeyLength(_))));
    }

    #[test]
    fn test_decrypt_rejects_bad_nonce_length() {
        let result = decrypt_resource(TEST_KEY, "short", "", "AAAA");
        assert!(matches!(result, Err(DecryptError::NonceLength(_))));
    }
}
