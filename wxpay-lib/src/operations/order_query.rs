//! Order query: look up the payment state of an order.

use std::fmt;
use std::str::FromStr;

use crate::client::WxPayClient;
use crate::params::Params;
use crate::transport::Transport;
use crate::{Result, WxPayError};

use super::Operation;

impl<T: Transport> WxPayClient<T> {
    /// Query an order by exactly one of `transaction_id` or `out_trade_no`.
    pub async fn order_query(&self, params: Params) -> Result<Params> {
        self.execute(Operation::OrderQuery, params).await
    }
}

/// Payment state reported in `trade_state`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TradeState {
    /// Paid.
    Success,
    /// Refund in progress or done.
    Refund,
    /// Not paid yet.
    NotPay,
    /// Closed.
    Closed,
    /// Revoked (micropay only).
    Revoked,
    /// Waiting for the payer to enter a password.
    UserPaying,
    /// Payment failed.
    PayError,
}

impl TradeState {
    /// Wire token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Refund => "REFUND",
            Self::NotPay => "NOTPAY",
            Self::Closed => "CLOSED",
            Self::Revoked => "REVOKED",
            Self::UserPaying => "USERPAYING",
            Self::PayError => "PAYERROR",
        }
    }

    /// Whether the state can still change.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::NotPay | Self::UserPaying)
    }

    /// Read `trade_state` from an order query response.
    pub fn from_response(response: &Params) -> Result<Self> {
        response.get_str("trade_state")?.parse()
    }
}

impl FromStr for TradeState {
    type Err = WxPayError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "SUCCESS" => Self::Success,
            "REFUND" => Self::Refund,
            "NOTPAY" => Self::NotPay,
            "CLOSED" => Self::Closed,
            "REVOKED" => Self::Revoked,
            "USERPAYING" => Self::UserPaying,
            "PAYERROR" => Self::PayError,
            other => {
                return Err(WxPayError::TypeMismatch {
                    field: format!("trade_state={}", other),
                    expected: "a known trade state",
                })
            }
        })
    }
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::signing::SignType;
    use crate::test_utils::{fixtures, MockTransport, TestFixtures};

    fn client() -> WxPayClient<MockTransport> {
        WxPayClient::new(
            ClientConfig::new(
                TestFixtures::APP_ID,
                TestFixtures::MCH_ID,
                TestFixtures::API_KEY,
            )
            .with_sign_type(SignType::HmacSha256),
            MockTransport::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_order_query_hmac() {
        let client = client();
        let mut fields = Params::new();
        fields
            .add("trade_state", "SUCCESS")
            .add("out_trade_no", "T1")
            .add("total_fee", 101)
            .add("coupon_count", 1)
            .add("coupon_fee_0", 1)
            .add("coupon_id_0", "c0");
        client.transport().push_response(fixtures::signed_success(
            &fields,
            TestFixtures::API_KEY,
            SignType::HmacSha256,
        ));

        let params: Params = [("out_trade_no", "T1")].into_iter().collect();
        let response = client.order_query(params).await.unwrap();
        assert_eq!(TradeState::from_response(&response).unwrap(), TradeState::Success);
        assert_eq!(response.get_int("coupon_fee_0").unwrap(), 1);
        assert_eq!(response.get_str("coupon_id_0").unwrap(), "c0");

        let sent = client.transport().requests();
        assert!(sent[0].url.ends_with("/pay/orderquery"));
        assert!(String::from_utf8_lossy(&sent[0].body).contains("HMAC-SHA256"));
    }

    #[tokio::test]
    async fn test_order_query_needs_one_id() {
        let client = client();
        let err = client.order_query(Params::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "need one of transaction_id/out_trade_no");

        let params: Params = [("out_trade_no", "T1"), ("transaction_id", "42")]
            .into_iter()
            .collect();
        assert!(matches!(
            client.order_query(params).await,
            Err(WxPayError::ConflictingParams(_))
        ));
    }

    #[test]
    fn test_trade_state_tokens() {
        for state in [
            TradeState::Success,
            TradeState::Refund,
            TradeState::NotPay,
            TradeState::Closed,
            TradeState::Revoked,
            TradeState::UserPaying,
            TradeState::PayError,
        ] {
            assert_eq!(state.as_str().parse::<TradeState>().unwrap(), state);
        }
        assert!("PENDING".parse::<TradeState>().is_err());
        assert!(!TradeState::NotPay.is_final());
        assert!(TradeState::Closed.is_final());
    }
}
