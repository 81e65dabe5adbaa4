//! Merchant client.
//!
//! A [`WxPayClient`] binds one merchant account ([`ClientConfig`]) to a
//! [`Transport`] and holds a bag of shared default parameters that every
//! outbound request starts from. Clients are plain values; several can be
//! used side by side for different merchant accounts.
//!
//! The shared bag sits behind a mutex that is only held while it is read or
//! written, never across a transport call.

pub mod config;

use std::sync::{Mutex, MutexGuard};

pub use config::{ApiKey, ClientConfig, Endpoints};

use crate::notify::{self, Recipient, RefundNotification};
use crate::params::{ParamValue, Params};
use crate::transport::{HttpTransport, Transport};
use crate::{Result, WxPayError};

/// Gateway client for one merchant account.
pub struct WxPayClient<T: Transport> {
    pub(crate) config: ClientConfig,
    pub(crate) transport: T,
    shared: Mutex<Params>,
}

impl<T: Transport> std::fmt::Debug for WxPayClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WxPayClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> WxPayClient<T> {
    /// Create a client after validating `config`.
    pub fn new(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            shared: Mutex::new(Params::new()),
        })
    }

    /// Account configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn shared(&self, context: &str) -> Result<MutexGuard<'_, Params>> {
        self.shared
            .lock()
            .map_err(|_| WxPayError::lock_poisoned(context))
    }

    /// Replace the shared default parameters.
    pub fn set_params(&self, params: Params) -> Result<()> {
        *self.shared("set_params")? = params;
        Ok(())
    }

    /// Add or overwrite one shared default parameter.
    pub fn add_param(&self, key: impl Into<String>, value: impl Into<ParamValue>) -> Result<()> {
        self.shared("add_param")?.add(key, value);
        Ok(())
    }

    /// Merge `params` into the shared defaults.
    pub fn add_params(&self, params: &Params) -> Result<()> {
        self.shared("add_params")?.merge(params);
        Ok(())
    }

    /// Remove a shared default parameter.
    pub fn del_param(&self, key: &str) -> Result<Option<ParamValue>> {
        Ok(self.shared("del_param")?.delete(key))
    }

    /// Snapshot of the shared default parameters.
    pub fn params(&self) -> Result<Params> {
        Ok(self.shared("params")?.clone())
    }

    /// Identity notifications addressed to this account must carry.
    pub fn recipient(&self) -> Recipient<'_> {
        Recipient {
            app_id: &self.config.app_id,
            mch_id: &self.config.mch_id,
            api_key: self.config.api_key.expose(),
            sign_type: self.config.sign_type,
        }
    }

    /// Decode, check and decrypt a refund result notification body.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, body), fields(len = body.len())))]
    pub fn refund_notify(&self, body: &[u8]) -> Result<RefundNotification> {
        notify::open_refund_notification(body, &self.recipient())
    }
}

impl WxPayClient<HttpTransport> {
    /// Create a client backed by [`HttpTransport`] with the configured timeout.
    pub fn http(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout())?;
        Self::new(config, transport)
    }
}
