//! Field encryption cho dữ liệu nhạy cảm lưu xuống file (lý do giao dịch).
//!
//! XChaCha20-Poly1305, nonce ngẫu nhiên 192-bit cho mỗi lần mã hóa.
//! Key lấy từ secret store (environment variable), không bao giờ hard-code.
//!
//! Định dạng output: `hex(nonce || ciphertext)`.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

pub type CipherResult<T> = Result<T, CipherError>;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct KeyBytes([u8; KEY_LEN]);

/// Mã hóa/giải mã chuỗi với key 256-bit.
#[derive(Clone)]
pub struct FieldCipher {
    key: KeyBytes,
}

impl FieldCipher {
    pub fn from_key(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            key: KeyBytes(bytes),
        }
    }

    /// Key dạng hex (64 ký tự)
    pub fn from_hex(hex_key: &str) -> CipherResult<Self> {
        let mut decoded = hex::decode(hex_key.trim())
            .map_err(|e| CipherError::InvalidKey(format!("not hex: {}", e)))?;

        if decoded.len() != KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(CipherError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_LEN, len
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self::from_key(bytes))
    }

    /// Đọc key từ environment variable.
    ///
    /// `Ok(None)` nếu biến không được set; lỗi nếu set nhưng sai định dạng.
    pub fn from_env(var: &str) -> CipherResult<Option<Self>> {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Self::from_hex(&value).map(Some),
            _ => Ok(None),
        }
    }

    /// Sinh key ngẫu nhiên dạng hex để provision vào secret store
    pub fn generate_key_hex() -> String {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        let encoded = hex::encode(bytes);
        bytes.zeroize();
        encoded
    }

    fn aead(&self) -> CipherResult<XChaCha20Poly1305> {
        XChaCha20Poly1305::new_from_slice(&self.key.0)
            .map_err(|e| CipherError::InvalidKey(e.to_string()))
    }

    /// Mã hóa chuỗi. Chuỗi rỗng giữ nguyên.
    pub fn encrypt(&self, plaintext: &str) -> CipherResult<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .aead()?
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    /// Giải mã chuỗi do `encrypt` tạo ra
    pub fn decrypt(&self, encoded: &str) -> CipherResult<String> {
        if encoded.is_empty() {
            return Ok(String::new());
        }

        let raw = hex::decode(encoded.trim())
            .map_err(|e| CipherError::DecryptionFailed(format!("not hex: {}", e)))?;
        if raw.len() <= NONCE_LEN {
            return Err(CipherError::DecryptionFailed("ciphertext too short".to_string()));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .aead()?
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|e| CipherError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CipherError::DecryptionFailed(e.to_string()))
    }
}

impl fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCipher").field("key", &"[REDACTED]").finish()
    }
}
