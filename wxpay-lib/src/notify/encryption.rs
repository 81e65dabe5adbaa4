//! AES-256-ECB decryption of the refund notification `req_info` field.
//!
//! # Pipeline
//!
//! 1. base64-decode `req_info` (standard alphabet, padded)
//! 2. key = ASCII bytes of the lower-case hex MD5 of the merchant API key
//! 3. AES-256-ECB decrypt, remove PKCS#7 padding
//!
//! The plaintext is an XML document (`<root>…</root>`) that the caller decodes
//! with the refund-info schema.
//!
//! Each stage fails with its own error so a corrupted payload
//! ([`WxPayError::Base64`], [`WxPayError::CipherLength`]) can be told apart
//! from a wrong key (usually [`WxPayError::Padding`]).
//!
//! ECB carries no integrity check. [`decrypt`] and [`decrypt_req_info`] only
//! notice corruption in the last block, where it breaks the padding; a flipped
//! byte anywhere else decrypts to garbage without error. Rejecting that
//! garbage is left to the inner XML decode in
//! [`open_refund_notification`](crate::notify::open_refund_notification).

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use zeroize::Zeroizing;

use crate::{Result, WxPayError};

type Aes256EcbDec = ecb::Decryptor<aes::Aes256>;
type Aes256EcbEnc = ecb::Encryptor<aes::Aes256>;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Derive the AES-256 key from the merchant API key.
///
/// The 32 hex characters are used directly as key material; they are not
/// decoded back to 16 bytes.
pub fn derive_key(api_key: &str) -> Zeroizing<[u8; 32]> {
    let hex_digest = Zeroizing::new(format!("{:x}", md5::compute(api_key.as_bytes())));
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(hex_digest.as_bytes());
    key
}

/// Decrypt a `req_info` value into the inner XML document.
pub fn decrypt_req_info(req_info: &str, api_key: &str) -> Result<Vec<u8>> {
    let cipher_text = STANDARD
        .decode(req_info.trim())
        .map_err(|e| WxPayError::Base64(e.to_string()))?;
    decrypt(&cipher_text, &derive_key(api_key))
}

/// Encrypt an inner document into a `req_info` value.
///
/// This is the gateway's side of the pipeline; it exists to build
/// notifications for tests and local simulation.
pub fn encrypt_req_info(plaintext: &[u8], api_key: &str) -> Result<String> {
    let cipher_text = encrypt(plaintext, &derive_key(api_key))?;
    Ok(STANDARD.encode(cipher_text))
}

/// AES-256-ECB decrypt and strip PKCS#7 padding.
pub fn decrypt(cipher_text: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    if cipher_text.is_empty() || cipher_text.len() % BLOCK_SIZE != 0 {
        return Err(WxPayError::CipherLength(cipher_text.len()));
    }
    let cipher = Aes256EcbDec::new_from_slice(key)
        .map_err(|e| WxPayError::Internal(format!("AES key setup failed: {}", e)))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(cipher_text)
        .map_err(|_| WxPayError::Padding)
}

/// AES-256-ECB encrypt with PKCS#7 padding.
pub fn encrypt(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>> {
    let cipher = Aes256EcbEnc::new_from_slice(key)
        .map_err(|e| WxPayError::Internal(format!("AES key setup failed: {}", e)))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}
