//! Client configuration.
//!
//! # Environment Variables
//!
//! [`ClientConfig::from_env`] reads:
//! - `WXPAY_APP_ID` - application id (`appid`)
//! - `WXPAY_MCH_ID` - merchant id (`mch_id`)
//! - `WXPAY_API_KEY` - merchant API key used for signing and notification decryption
//! - `WXPAY_SIGN_TYPE` - `MD5` or `HMAC-SHA256` (optional, default `MD5`)
//! - `WXPAY_API_BASE` - gateway base URL (optional; `sandbox` selects the sandbox preset)

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::signing::SignType;
use crate::{Result, WxPayError};

/// Production gateway.
pub const PRODUCTION_BASE: &str = "https://api.mch.weixin.qq.com";

/// Sandbox gateway.
pub const SANDBOX_BASE: &str = "https://api.mch.weixin.qq.com/sandboxnew";

/// Merchant API key. Redacted in `Debug`, wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key for signing or key derivation.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl Drop for ApiKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Gateway endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Base URL; paths are appended after a single `/`.
    pub base_url: String,

    /// Unified order path.
    #[serde(default = "default_unified_order_path")]
    pub unified_order: String,

    /// Order query path.
    #[serde(default = "default_order_query_path")]
    pub order_query: String,

    /// Refund query path.
    #[serde(default = "default_refund_query_path")]
    pub refund_query: String,
}

fn default_unified_order_path() -> String {
    "pay/unifiedorder".to_string()
}

fn default_order_query_path() -> String {
    "pay/orderquery".to_string()
}

fn default_refund_query_path() -> String {
    "pay/refundquery".to_string()
}

impl Endpoints {
    /// Endpoints under an arbitrary base URL.
    pub fn with_base(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            unified_order: default_unified_order_path(),
            order_query: default_order_query_path(),
            refund_query: default_refund_query_path(),
        }
    }

    /// Live gateway.
    pub fn production() -> Self {
        Self::with_base(PRODUCTION_BASE)
    }

    /// Sandbox gateway.
    pub fn sandbox() -> Self {
        Self::with_base(SANDBOX_BASE)
    }

    /// Join the base URL and `path`.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::production()
    }
}

/// Configuration of one merchant account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Application id (`appid`).
    pub app_id: String,

    /// Merchant id (`mch_id`).
    pub mch_id: String,

    /// Merchant API key.
    pub api_key: ApiKey,

    /// Algorithm used when a request does not carry `sign_type`.
    #[serde(default)]
    pub sign_type: SignType,

    /// Request timeout in seconds, applied by [`HttpTransport`](crate::transport::HttpTransport).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Gateway endpoints.
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Create a configuration for the production gateway.
    pub fn new(
        app_id: impl Into<String>,
        mch_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            mch_id: mch_id.into(),
            api_key: ApiKey::new(api_key),
            sign_type: SignType::default(),
            timeout_secs: default_timeout(),
            endpoints: Endpoints::production(),
        }
    }

    /// Set the default signature algorithm.
    pub fn with_sign_type(mut self, sign_type: SignType) -> Self {
        self.sign_type = sign_type;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the gateway endpoints.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Point at the sandbox gateway.
    pub fn sandbox(self) -> Self {
        self.with_endpoints(Endpoints::sandbox())
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject incomplete identity.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(WxPayError::invalid_config("app_id", "must not be empty"));
        }
        if self.mch_id.trim().is_empty() {
            return Err(WxPayError::invalid_config("mch_id", "must not be empty"));
        }
        if self.api_key.is_empty() {
            return Err(WxPayError::invalid_config("api_key", "must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(WxPayError::invalid_config("timeout_secs", "must be positive"));
        }
        if !self.endpoints.base_url.starts_with("http://")
            && !self.endpoints.base_url.starts_with("https://")
        {
            return Err(WxPayError::invalid_config(
                "endpoints.base_url",
                format!("not an http(s) URL: {}", self.endpoints.base_url),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `WXPAY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &str| {
            lookup(name).ok_or_else(|| WxPayError::invalid_config(name, "environment variable not set"))
        };

        let mut config = Self::new(
            require("WXPAY_APP_ID")?,
            require("WXPAY_MCH_ID")?,
            require("WXPAY_API_KEY")?,
        );

        if let Some(sign_type) = lookup("WXPAY_SIGN_TYPE") {
            config.sign_type = sign_type.parse()?;
        }
        match lookup("WXPAY_API_BASE").as_deref() {
            None | Some("") => {}
            Some("sandbox") => config.endpoints = Endpoints::sandbox(),
            Some(base) => config.endpoints = Endpoints::with_base(base),
        }

        config.validate()?;
        Ok(config)
    }
}
