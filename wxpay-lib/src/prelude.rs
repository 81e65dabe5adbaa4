//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use wxpay_lib::prelude::*;
//! ```
//!
//! ## What's Included
//!
//! - Client: `WxPayClient`, `ClientConfig`, `Endpoints`
//! - Parameters: `Params`, `ParamValue`
//! - Signing: `SignType`, `SignedEnvelope`
//! - Errors: `WxPayError`, `WxPayErrorCode`, `ErrorCategory`, `Result`
//! - Transport: `Transport`, `PostRequest`, `HttpTransport`
//! - Responses: `RefundNotification`, `RefundRecord`, `TradeState`, `Prepay`

// Client
pub use crate::client::{ClientConfig, Endpoints, WxPayClient};

// Parameters and signing
pub use crate::params::{ParamValue, Params};
pub use crate::signing::{SignType, SignedEnvelope};

// Error handling
pub use crate::errors::{ErrorCategory, WxPayError, WxPayErrorCode};
pub use crate::Result;

// Transport
pub use crate::transport::{HttpTransport, PostRequest, Transport};

// Typed responses
pub use crate::notify::RefundNotification;
pub use crate::operations::{Operation, Prepay, RefundRecord, TradeState};
