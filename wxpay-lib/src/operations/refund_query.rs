//! Refund query: look up the refunds of an order.
//!
//! The response lists refunds as indexed fields (`out_refund_no_0`,
//! `refund_fee_0`, `refund_status_0`, ...) counted by `refund_count`.
//! [`RefundRecord::collect`] turns them into one record per refund.

use crate::client::WxPayClient;
use crate::params::Params;
use crate::transport::Transport;
use crate::Result;

use super::Operation;

impl<T: Transport> WxPayClient<T> {
    /// Query refunds by exactly one of `transaction_id`, `out_trade_no`,
    /// `out_refund_no` or `refund_id`.
    pub async fn refund_query(&self, params: Params) -> Result<Params> {
        self.execute(Operation::RefundQuery, params).await
    }
}

/// One refund listed in a refund query response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefundRecord {
    /// Merchant refund number.
    pub out_refund_no: String,
    /// Gateway refund id.
    pub refund_id: String,
    /// Refund amount, in fen.
    pub refund_fee: i64,
    /// Settled refund amount, when coupons were involved.
    pub settlement_refund_fee: Option<i64>,
    /// `SUCCESS`, `REFUNDCLOSE`, `PROCESSING` or `CHANGE`.
    pub refund_status: String,
    /// Account that received the refund.
    pub refund_recv_accout: Option<String>,
    /// Completion time.
    pub refund_success_time: Option<String>,
}

impl RefundRecord {
    /// Collect the `refund_count` records of a response.
    pub fn collect(response: &Params) -> Result<Vec<RefundRecord>> {
        let count = response.get_int("refund_count")?;
        (0..count).map(|n| Self::at(response, n)).collect()
    }

    fn at(response: &Params, n: i64) -> Result<Self> {
        let key = |name: &str| format!("{}_{}", name, n);
        let opt_int = |name: &str| -> Result<Option<i64>> {
            let key = key(name);
            match response.get(&key) {
                None => Ok(None),
                Some(_) => response.get_int(&key).map(Some),
            }
        };

        Ok(Self {
            out_refund_no: response.get_str(&key("out_refund_no"))?.to_string(),
            refund_id: response.get_str(&key("refund_id"))?.to_string(),
            refund_fee: response.get_int(&key("refund_fee"))?,
            settlement_refund_fee: opt_int("settlement_refund_fee")?,
            refund_status: response.get_str(&key("refund_status"))?.to_string(),
            refund_recv_accout: response
                .opt_str(&key("refund_recv_accout"))?
                .map(str::to_string),
            refund_success_time: response
                .opt_str(&key("refund_success_time"))?
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::signing::SignType;
    use crate::test_utils::{fixtures, MockTransport};
    use crate::WxPayError;

    const KEY: &str = "refund-query-test-key";

    fn client() -> WxPayClient<MockTransport> {
        WxPayClient::new(ClientConfig::new("wx1", "m1", KEY), MockTransport::new()).unwrap()
    }

    fn two_refunds() -> Params {
        let mut fields = Params::new();
        fields
            .add("out_trade_no", "T1")
            .add("total_fee", 100)
            .add("refund_count", 2)
            .add("out_refund_no_0", "R0")
            .add("refund_id_0", "50000000001")
            .add("refund_fee_0", 30)
            .add("refund_status_0", "SUCCESS")
            .add("refund_success_time_0", "2026-10-01 12:00:00")
            .add("out_refund_no_1", "R1")
            .add("refund_id_1", "50000000002")
            .add("refund_fee_1", 20)
            .add("settlement_refund_fee_1", 18)
            .add("refund_status_1", "PROCESSING");
        fields
    }

    #[tokio::test]
    async fn test_refund_query_by_trade_no() {
        let client = client();
        client
            .transport()
            .push_response(fixtures::signed_success(&two_refunds(), KEY, SignType::Md5));

        let params: Params = [("out_trade_no", "T1")].into_iter().collect();
        let response = client.refund_query(params).await.unwrap();

        let records = RefundRecord::collect(&response).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].out_refund_no, "R0");
        assert_eq!(records[0].refund_fee, 30);
        assert_eq!(records[0].settlement_refund_fee, None);
        assert_eq!(
            records[0].refund_success_time.as_deref(),
            Some("2026-10-01 12:00:00")
        );
        assert_eq!(records[1].settlement_refund_fee, Some(18));
        assert_eq!(records[1].refund_status, "PROCESSING");

        let request = crate::xml::decode(
            &client.transport().requests()[0].body,
            Operation::RefundQuery.request_schema(),
        )
        .unwrap();
        assert_eq!(request.get_str("appid").unwrap(), "wx1");
        assert_eq!(request.get_str("mch_id").unwrap(), "m1");
        assert_eq!(request.get_str("out_trade_no").unwrap(), "T1");
    }

    #[tokio::test]
    async fn test_trade_no_and_refund_id_conflict() {
        let client = client();
        let params: Params = [("out_trade_no", "T1"), ("refund_id", "R1")]
            .into_iter()
            .collect();
        let err = client.refund_query(params).await.unwrap_err();
        assert!(err.to_string().contains("more than one"));
        assert_eq!(client.transport().request_count(), 0);
    }

    #[tokio::test]
    async fn test_gateway_busy() {
        let client = client();
        client
            .transport()
            .push_response(fixtures::return_failed("system busy"));
        let params: Params = [("refund_id", "R1")].into_iter().collect();
        let err = client.refund_query(params).await.unwrap_err();
        assert_eq!(err.to_string(), "system busy");
    }

    #[tokio::test]
    async fn test_forged_response_is_not_returned() {
        let client = client();
        client
            .transport()
            .push_response(fixtures::signed_success(&two_refunds(), "attacker-key", SignType::Md5));
        let params: Params = [("out_refund_no", "R0")].into_iter().collect();
        assert!(matches!(
            client.refund_query(params).await,
            Err(WxPayError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_collect_reports_missing_record_fields() {
        let mut fields = two_refunds();
        fields.delete("refund_fee_1");
        assert!(matches!(
            RefundRecord::collect(&fields),
            Err(WxPayError::MissingField(ref k)) if k == "refund_fee_1"
        ));
    }
}
