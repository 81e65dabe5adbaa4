//! Test utilities for gateway clients.
//!
//! This module provides:
//! - [`MockTransport`], which records requests and replays canned responses
//! - [`fixtures`], which builds signed responses and encrypted notifications
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wxpay_lib::test_utils::{fixtures, MockTransport, TestFixtures};
//! use wxpay_lib::{ClientConfig, Params, SignType, WxPayClient};
//!
//! let config = ClientConfig::new(TestFixtures::APP_ID, TestFixtures::MCH_ID, TestFixtures::API_KEY);
//! let client = WxPayClient::new(config, MockTransport::new())?;
//! client.transport().push_response(fixtures::signed_success(
//!     &Params::new(),
//!     TestFixtures::API_KEY,
//!     SignType::Md5,
//! ));
//! ```

pub mod fixtures;
mod mock_transport;

pub use fixtures::TestFixtures;
pub use mock_transport::MockTransport;
