//! Canonical signing of parameter bags.
//!
//! The canonical string is built from every non-empty field except `sign`,
//! sorted byte-wise by key and joined as `k1=v1&k2=v2`, followed by
//! `&key=<merchant key>`. The digest is MD5, or HMAC-SHA256 keyed with the
//! merchant key, rendered as upper-case hex.
//!
//! A `sign_type` value other than `MD5` or `HMAC-SHA256` is rejected on both
//! the signing and the verification path.
//!
//! # Example
//!
//! ```
//! use wxpay_lib::{Params, SignType, signing::sign};
//!
//! let params: Params = [("appid", "wx1"), ("mch_id", "m1")].into_iter().collect();
//! let signature = sign(&params, "secret", SignType::Md5);
//! assert_eq!(signature.len(), 32);
//! assert_eq!(signature, signature.to_uppercase());
//! ```

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::params::{ParamValue, Params, SIGN_KEY, SIGN_TYPE_KEY};
use crate::{Result, WxPayError};

/// Signature algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignType {
    /// MD5 over the canonical string (gateway default).
    #[default]
    #[serde(rename = "MD5")]
    Md5,
    /// HMAC-SHA256 keyed with the merchant key.
    #[serde(rename = "HMAC-SHA256")]
    HmacSha256,
}

impl SignType {
    /// Wire token of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::HmacSha256 => "HMAC-SHA256",
        }
    }

    /// Algorithm selected by the bag's `sign_type` field, or `default` when absent.
    pub fn from_params(params: &Params, default: SignType) -> Result<SignType> {
        match params.get(SIGN_TYPE_KEY) {
            None => Ok(default),
            Some(ParamValue::Str(token)) => token.parse(),
            Some(other) => Err(WxPayError::UnsupportedSignType(other.to_string())),
        }
    }
}

impl FromStr for SignType {
    type Err = WxPayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "MD5" => Ok(Self::Md5),
            "HMAC-SHA256" => Ok(Self::HmacSha256),
            other => Err(WxPayError::UnsupportedSignType(other.to_string())),
        }
    }
}

impl fmt::Display for SignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the string fed to the digest, including the trailing `&key=` part.
pub fn canonical_string(params: &Params, key: &str) -> String {
    let mut out = String::new();
    for (name, value) in params.sorted_pairs(SIGN_KEY) {
        if value.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(name);
        out.push('=');
        out.push_str(&value);
    }
    out.push_str("&key=");
    out.push_str(key);
    out
}

/// Compute the upper-case hex signature of `params`.
pub fn sign(params: &Params, key: &str, sign_type: SignType) -> String {
    let canonical = canonical_string(params, key);
    let digest = match sign_type {
        SignType::Md5 => md5::compute(canonical.as_bytes()).0.to_vec(),
        SignType::HmacSha256 => hmac_sha256(key.as_bytes(), canonical.as_bytes()),
    };
    hex::encode_upper(digest)
}

/// Check the carried `sign` of `params` against the recomputed one.
pub fn verify(params: &Params, key: &str, sign_type: SignType) -> Result<()> {
    let carried = match params.get(SIGN_KEY) {
        Some(ParamValue::Str(s)) => s.as_str(),
        Some(_) => return Err(WxPayError::SignatureMismatch),
        None => return Err(WxPayError::MissingSignature),
    };
    let expected = sign(params, key, sign_type);
    if bool::from(expected.as_bytes().ct_eq(carried.as_bytes())) {
        Ok(())
    } else {
        Err(WxPayError::SignatureMismatch)
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let mut mac = match Hmac::<Sha256>::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC key length is unrestricted"),
    };
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// A bag whose `sign` field is known to match its other fields.
///
/// Values are only produced by [`SignedEnvelope::seal`] (outbound) or
/// [`SignedEnvelope::open`] (inbound), so holding one means the signature
/// invariant holds for the stated algorithm and key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedEnvelope {
    params: Params,
    sign_type: SignType,
}

impl SignedEnvelope {
    /// Sign `params` and append the `sign` field.
    ///
    /// An existing `sign` field is replaced, never signed over.
    pub fn seal(mut params: Params, key: &str, sign_type: SignType) -> Self {
        let signature = sign(&params, key, sign_type);
        params.add(SIGN_KEY, signature);
        Self { params, sign_type }
    }

    /// Verify a received bag and wrap it.
    pub fn open(params: Params, key: &str, sign_type: SignType) -> Result<Self> {
        verify(&params, key, sign_type)?;
        Ok(Self { params, sign_type })
    }

    /// The carried signature.
    pub fn signature(&self) -> &str {
        self.params.get_str(SIGN_KEY).unwrap_or_default()
    }

    /// Algorithm used.
    pub fn sign_type(&self) -> SignType {
        self.sign_type
    }

    /// The signed bag, including `sign`.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Unwrap into the signed bag.
    pub fn into_params(self) -> Params {
        self.params
    }
}
