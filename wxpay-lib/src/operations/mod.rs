//! Request orchestration shared by every gateway call.
//!
//! Each call runs the same pipeline:
//!
//! 1. start from the client's shared defaults, restricted to the operation's allow-list
//! 2. overlay caller parameters, then the account identity (`appid`, `mch_id`)
//! 3. fill `nonce_str` when absent and resolve the signature algorithm
//! 4. validate, sign, encode and hand the document to the transport
//! 5. decode the response, check `return_code` then `result_code`, verify `sign`
//!
//! Steps 1-4 are available on their own as [`WxPayClient::prepare`] and step 5
//! as [`WxPayClient::check_response`], for callers that deliver documents
//! themselves.

pub mod order_query;
pub mod refund_query;
pub mod unified_order;

use std::fmt;

use crate::client::{Endpoints, WxPayClient};
use crate::params::schema::{self, Schema};
use crate::params::validate::validate;
use crate::params::{Params, SIGN_TYPE_KEY};
use crate::signing::{SignType, SignedEnvelope};
use crate::transport::{PostRequest, Transport};
use crate::{nonce, xml, Result, WxPayError};

pub use order_query::TradeState;
pub use refund_query::RefundRecord;
pub use unified_order::Prepay;

/// Token the gateway uses for success in both status fields.
pub const SUCCESS: &str = "SUCCESS";

/// A request/response gateway call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// `/pay/unifiedorder`
    UnifiedOrder,
    /// `/pay/orderquery`
    OrderQuery,
    /// `/pay/refundquery`
    RefundQuery,
}

impl Operation {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UnifiedOrder => "unifiedorder",
            Self::OrderQuery => "orderquery",
            Self::RefundQuery => "refundquery",
        }
    }

    /// Field table of the outbound document.
    pub fn request_schema(&self) -> &'static Schema {
        match self {
            Self::UnifiedOrder => &schema::UNIFIED_ORDER_REQUEST,
            Self::OrderQuery => &schema::ORDER_QUERY_REQUEST,
            Self::RefundQuery => &schema::REFUND_QUERY_REQUEST,
        }
    }

    /// Field table of the response document.
    pub fn response_schema(&self) -> &'static Schema {
        match self {
            Self::UnifiedOrder => &schema::UNIFIED_ORDER_RESPONSE,
            Self::OrderQuery => &schema::ORDER_QUERY_RESPONSE,
            Self::RefundQuery => &schema::REFUND_QUERY_RESPONSE,
        }
    }

    /// Endpoint path for this call.
    pub fn path<'a>(&self, endpoints: &'a Endpoints) -> &'a str {
        match self {
            Self::UnifiedOrder => &endpoints.unified_order,
            Self::OrderQuery => &endpoints.order_query,
            Self::RefundQuery => &endpoints.refund_query,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<T: Transport> WxPayClient<T> {
    /// Build the signed request bag for `operation`.
    pub fn prepare(&self, operation: Operation, params: Params) -> Result<SignedEnvelope> {
        let request = operation.request_schema();

        // Lock is released at the end of this statement.
        let mut bag: Params = self
            .params()?
            .iter()
            .filter(|(key, _)| request.allows(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        bag.merge(&params);
        bag.add("appid", &self.config.app_id)
            .add("mch_id", &self.config.mch_id);
        if !bag.contains("nonce_str") {
            bag.add("nonce_str", nonce::generate());
        }

        let sign_type = SignType::from_params(&bag, self.config.sign_type)?;
        if sign_type != SignType::Md5 && !bag.contains(SIGN_TYPE_KEY) {
            bag.add(SIGN_TYPE_KEY, sign_type.as_str());
        }

        validate(&bag, request)?;
        Ok(SignedEnvelope::seal(
            bag,
            self.config.api_key.expose(),
            sign_type,
        ))
    }

    /// Decode a response body and check status fields and signature.
    ///
    /// A failed `return_code` is reported before anything else is looked at;
    /// the signature is only verified on a fully successful response.
    pub fn check_response(
        &self,
        operation: Operation,
        body: &[u8],
        sign_type: SignType,
    ) -> Result<Params> {
        let response = xml::decode(body, operation.response_schema())?;

        match response.opt_str("return_code")? {
            Some(SUCCESS) => {}
            Some(_) => {
                return Err(WxPayError::ReturnFailed {
                    message: response.opt_str("return_msg")?.unwrap_or_default().to_string(),
                })
            }
            None => return Err(WxPayError::MissingStatus("return_code")),
        }

        match response.opt_str("result_code")? {
            Some(SUCCESS) => {}
            Some(_) => {
                return Err(WxPayError::ResultFailed {
                    code: response.opt_str("err_code")?.map(str::to_string),
                    message: response
                        .opt_str("err_code_des")?
                        .unwrap_or_default()
                        .to_string(),
                })
            }
            None => return Err(WxPayError::MissingStatus("result_code")),
        }

        SignedEnvelope::open(response, self.config.api_key.expose(), sign_type)
            .map(SignedEnvelope::into_params)
    }

    /// Run the full pipeline for `operation`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, params), fields(operation = %operation)))]
    pub async fn execute(&self, operation: Operation, params: Params) -> Result<Params> {
        let envelope = self.prepare(operation, params)?;
        let sign_type = envelope.sign_type();
        let body = xml::encode(envelope.params(), operation.request_schema().root)?;

        let endpoints = &self.config.endpoints;
        let request = PostRequest {
            url: endpoints.url(operation.path(endpoints)),
            content_type: xml::CONTENT_TYPE,
            body,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %request.url, %sign_type, "sending request");

        let response = self.transport.post(request).await?;
        let result = self.check_response(operation, &response, sign_type);

        #[cfg(feature = "tracing")]
        {
            if let Err(err) = &result {
                tracing::debug!(code = ?err.code(), "response rejected");
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::signing;
    use crate::test_utils::{fixtures, MockTransport};

    const KEY: &str = "192006250b4c09247ec02edce69f6a2d";

    fn client() -> WxPayClient<MockTransport> {
        WxPayClient::new(ClientConfig::new("wx1", "m1", KEY), MockTransport::new()).unwrap()
    }

    fn refund_query_params() -> Params {
        [("out_trade_no", "T1")].into_iter().collect()
    }

    #[test]
    fn test_prepare_fills_identity_and_nonce() {
        let envelope = client()
            .prepare(Operation::RefundQuery, refund_query_params())
            .unwrap();
        let bag = envelope.params();
        assert_eq!(bag.get_str("appid").unwrap(), "wx1");
        assert_eq!(bag.get_str("mch_id").unwrap(), "m1");
        assert_eq!(bag.get_str("nonce_str").unwrap().len(), crate::nonce::NONCE_LEN);
        assert!(!bag.contains(SIGN_TYPE_KEY));
        assert!(signing::verify(bag, KEY, SignType::Md5).is_ok());
    }

    #[test]
    fn test_identity_overrides_caller() {
        let mut params = refund_query_params();
        params.add("mch_id", "someone-else").add("nonce_str", "fixed");
        let envelope = client().prepare(Operation::RefundQuery, params).unwrap();
        assert_eq!(envelope.params().get_str("mch_id").unwrap(), "m1");
        assert_eq!(envelope.params().get_str("nonce_str").unwrap(), "fixed");
    }

    #[test]
    fn test_conflicting_one_of() {
        let mut params = refund_query_params();
        params.add("refund_id", "R1");
        let err = client()
            .prepare(Operation::RefundQuery, params)
            .unwrap_err();
        assert!(matches!(err, WxPayError::ConflictingParams(_)));
        assert!(err.to_string().starts_with("more than one of"));
    }

    #[test]
    fn test_shared_defaults_are_filtered_by_allow_list() {
        let client = client();
        client.add_param("offset", 2).unwrap();
        client.add_param("notify_url", "https://example.com/n").unwrap();

        let bag = client
            .prepare(Operation::RefundQuery, refund_query_params())
            .unwrap()
            .into_params();
        assert_eq!(bag.get_int("offset").unwrap(), 2);
        assert!(!bag.contains("notify_url"));
    }

    #[test]
    fn test_caller_overrides_shared_defaults() {
        let client = client();
        client.add_param("offset", 2).unwrap();
        let mut params = refund_query_params();
        params.add("offset", 5);
        let bag = client
            .prepare(Operation::RefundQuery, params)
            .unwrap()
            .into_params();
        assert_eq!(bag.get_int("offset").unwrap(), 5);
    }

    #[test]
    fn test_caller_unexpected_param_rejected() {
        let mut params = refund_query_params();
        params.add("body", "coffee");
        assert!(matches!(
            client().prepare(Operation::RefundQuery, params),
            Err(WxPayError::UnexpectedParam(ref k)) if k == "body"
        ));
    }

    #[test]
    fn test_hmac_default_is_written_into_bag() {
        let client = WxPayClient::new(
            ClientConfig::new("wx1", "m1", KEY).with_sign_type(SignType::HmacSha256),
            MockTransport::new(),
        )
        .unwrap();
        let envelope = client
            .prepare(Operation::RefundQuery, refund_query_params())
            .unwrap();
        assert_eq!(envelope.sign_type(), SignType::HmacSha256);
        assert_eq!(
            envelope.params().get_str(SIGN_TYPE_KEY).unwrap(),
            "HMAC-SHA256"
        );
        assert_eq!(envelope.signature().len(), 64);
    }

    #[test]
    fn test_unknown_sign_type_rejected() {
        let mut params = refund_query_params();
        params.add(SIGN_TYPE_KEY, "SHA1");
        assert!(matches!(
            client().prepare(Operation::RefundQuery, params),
            Err(WxPayError::UnsupportedSignType(_))
        ));
    }

    #[test]
    fn test_check_response_return_failed_skips_signature() {
        let body = fixtures::return_failed("system busy");
        let err = client()
            .check_response(Operation::RefundQuery, &body, SignType::Md5)
            .unwrap_err();
        assert!(matches!(err, WxPayError::ReturnFailed { .. }));
        assert_eq!(err.to_string(), "system busy");
    }

    #[test]
    fn test_check_response_result_failed() {
        let body = fixtures::result_failed(KEY, "REFUNDNOTEXIST", "refund not found");
        let err = client()
            .check_response(Operation::RefundQuery, &body, SignType::Md5)
            .unwrap_err();
        match err {
            WxPayError::ResultFailed { code, message } => {
                assert_eq!(code.as_deref(), Some("REFUNDNOTEXIST"));
                assert_eq!(message, "refund not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_response_missing_status() {
        let client = client();
        let err = client
            .check_response(Operation::OrderQuery, b"<xml><a>1</a></xml>", SignType::Md5)
            .unwrap_err();
        assert!(matches!(err, WxPayError::MissingStatus("return_code")));

        let err = client
            .check_response(
                Operation::OrderQuery,
                b"<xml><return_code>SUCCESS</return_code></xml>",
                SignType::Md5,
            )
            .unwrap_err();
        assert!(matches!(err, WxPayError::MissingStatus("result_code")));
    }

    #[test]
    fn test_check_response_signature() {
        let mut fields = Params::new();
        fields.add("out_trade_no", "T1");
        let body = fixtures::signed_success(&fields, KEY, SignType::Md5);
        let bag = client()
            .check_response(Operation::RefundQuery, &body, SignType::Md5)
            .unwrap();
        assert_eq!(bag.get_str("out_trade_no").unwrap(), "T1");
        assert!(signing::verify(&bag, KEY, SignType::Md5).is_ok());

        let forged = fixtures::with_signature(&fields, "0123456789ABCDEF0123456789ABCDEF");
        assert!(matches!(
            client().check_response(Operation::RefundQuery, &forged, SignType::Md5),
            Err(WxPayError::SignatureMismatch)
        ));
        assert!(matches!(
            client().check_response(Operation::RefundQuery, &body, SignType::HmacSha256),
            Err(WxPayError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_malformed_response() {
        assert!(matches!(
            client().check_response(Operation::RefundQuery, b"<xml><return_code>", SignType::Md5),
            Err(WxPayError::Xml(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_posts_signed_document() {
        let client = client();
        let mut fields = Params::new();
        fields.add("out_trade_no", "T1").add("refund_count", 0);
        client
            .transport()
            .push_response(fixtures::signed_success(&fields, KEY, SignType::Md5));

        let bag = client
            .execute(Operation::RefundQuery, refund_query_params())
            .await
            .unwrap();
        assert_eq!(bag.get_int("refund_count").unwrap(), 0);

        let sent = client.transport().requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://api.mch.weixin.qq.com/pay/refundquery");
        assert_eq!(sent[0].content_type, xml::CONTENT_TYPE);

        let request = xml::decode(&sent[0].body, Operation::RefundQuery.request_schema()).unwrap();
        assert_eq!(request.get_str("out_trade_no").unwrap(), "T1");
        assert!(signing::verify(&request, KEY, SignType::Md5).is_ok());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let client = client();
        client
            .transport()
            .push_error(WxPayError::Transport("connection reset".to_string()));
        let err = client
            .execute(Operation::RefundQuery, refund_query_params())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_validation_failure_sends_nothing() {
        let client = client();
        let err = client
            .execute(Operation::RefundQuery, Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WxPayError::MissingOneOf(_)));
        assert!(client.transport().requests().is_empty());
    }
}
