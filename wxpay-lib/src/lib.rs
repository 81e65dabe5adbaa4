//! WeChat Pay merchant API client.
//!
//! This crate builds signed requests for the gateway's v2 merchant API,
//! checks and verifies its responses, and decrypts refund result
//! notifications. Delivery of documents is delegated to a [`Transport`]
//! supplied by the caller.
//!
//! # Features
//!
//! - **Parameter validation**: per-operation field tables with must / one-of / optional rules
//! - **Canonical signing**: MD5 and HMAC-SHA256 signatures, constant-time verification
//! - **XML codec**: the gateway's flat element-per-field wire format
//! - **Notification decryption**: AES-256-ECB `req_info` payloads of refund notifications
//! - **Transport abstraction**: trait-based, with an optional reqwest implementation
//!
//! # Example
//!
//! ```rust,ignore
//! use wxpay_lib::{ClientConfig, Params, WxPayClient};
//! use wxpay_lib::operations::RefundRecord;
//!
//! let client = WxPayClient::http(ClientConfig::from_env()?)?;
//!
//! let mut params = Params::new();
//! params.add("out_trade_no", "T1");
//! let response = client.refund_query(params).await?;
//!
//! for refund in RefundRecord::collect(&response)? {
//!     println!("{} {} {}", refund.out_refund_no, refund.refund_fee, refund.refund_status);
//! }
//!
//! // In the notify_url handler:
//! let outcome = client.refund_notify(&body);
//! let reply = wxpay_lib::notify::ack(&outcome)?;
//! ```

pub mod client;
pub mod errors;
pub mod nonce;
pub mod notify;
pub mod operations;
pub mod params;
pub mod prelude;
pub mod signing;
pub mod transport;
pub mod xml;

/// Test utilities for gateway clients.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::{ClientConfig, Endpoints, WxPayClient};
pub use errors::{ErrorCategory, WxPayError, WxPayErrorCode};
pub use notify::RefundNotification;
pub use operations::Operation;
pub use params::{ParamValue, Params};
pub use signing::{SignType, SignedEnvelope};
pub use transport::{HttpTransport, PostRequest, Transport};

/// Common result alias for gateway operations.
pub type Result<T> = std::result::Result<T, WxPayError>;
