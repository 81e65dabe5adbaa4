//! Delivery of encoded documents to the gateway.
//!
//! The core only needs "send these bytes, get bytes back", expressed by the
//! [`Transport`] trait. [`HttpTransport`] is the reqwest-backed implementation
//! compiled with the `http-transport` feature.

mod http;
mod traits;

pub use http::HttpTransport;
pub use traits::{PostRequest, Transport};
