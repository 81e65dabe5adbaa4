//! Unified order: create a prepayment for a merchant order.

use crate::client::WxPayClient;
use crate::params::Params;
use crate::transport::Transport;
use crate::Result;

use super::Operation;

impl<T: Transport> WxPayClient<T> {
    /// Place a unified order.
    ///
    /// Required caller fields: `body`, `out_trade_no`, `total_fee` (fen),
    /// `spbill_create_ip`, `notify_url`, `trade_type`.
    pub async fn unified_order(&self, params: Params) -> Result<Params> {
        self.execute(Operation::UnifiedOrder, params).await
    }
}

/// Prepayment data of a successful unified order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prepay {
    /// Prepayment session id, valid for two hours.
    pub prepay_id: String,
    /// `JSAPI`, `NATIVE`, `APP` or `MWEB`.
    pub trade_type: String,
    /// QR code URL (`NATIVE` only).
    pub code_url: Option<String>,
    /// H5 redirect URL (`MWEB` only).
    pub mweb_url: Option<String>,
}

impl TryFrom<&Params> for Prepay {
    type Error = crate::WxPayError;

    fn try_from(response: &Params) -> Result<Self> {
        Ok(Self {
            prepay_id: response.get_str("prepay_id")?.to_string(),
            trade_type: response.get_str("trade_type")?.to_string(),
            code_url: response.opt_str("code_url")?.map(str::to_string),
            mweb_url: response.opt_str("mweb_url")?.map(str::to_string),
        })
    }
}
