//! Asynchronous refund result notifications.
//!
//! The gateway POSTs an outer document carrying `return_code`, the merchant
//! identity and an encrypted `req_info` field. [`open_refund_notification`]
//! checks the envelope, decrypts `req_info` and decodes the inner document;
//! [`ack`] builds the reply the gateway expects in return.

pub mod encryption;

use crate::params::schema::{NOTIFY_ACK, REFUND_NOTIFY_ENVELOPE, REFUND_NOTIFY_INFO};
use crate::params::{Params, SIGN_KEY};
use crate::signing::{SignType, SignedEnvelope};
use crate::{xml, Result, WxPayError};

/// Status token used by the gateway for success.
pub const SUCCESS: &str = "SUCCESS";

/// Status token used by the gateway for failure.
pub const FAIL: &str = "FAIL";

/// A decoded refund notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefundNotification {
    /// Outer envelope (`return_code`, `appid`, `mch_id`, `nonce_str`, `req_info`).
    pub envelope: Params,
    /// Decrypted refund fields.
    pub info: Params,
}

impl RefundNotification {
    /// Gateway transaction id.
    pub fn transaction_id(&self) -> Result<&str> {
        self.info.get_str("transaction_id")
    }

    /// Merchant order number.
    pub fn out_trade_no(&self) -> Result<&str> {
        self.info.get_str("out_trade_no")
    }

    /// Gateway refund id.
    pub fn refund_id(&self) -> Result<&str> {
        self.info.get_str("refund_id")
    }

    /// Merchant refund number.
    pub fn out_refund_no(&self) -> Result<&str> {
        self.info.get_str("out_refund_no")
    }

    /// Order total, in fen.
    pub fn total_fee(&self) -> Result<i64> {
        self.info.get_int("total_fee")
    }

    /// Refund amount requested, in fen.
    pub fn refund_fee(&self) -> Result<i64> {
        self.info.get_int("refund_fee")
    }

    /// Refund amount actually settled, in fen.
    pub fn settlement_refund_fee(&self) -> Result<i64> {
        self.info.get_int("settlement_refund_fee")
    }

    /// `SUCCESS`, `CHANGE` or `REFUNDCLOSE`.
    pub fn refund_status(&self) -> Result<&str> {
        self.info.get_str("refund_status")
    }

    /// Whether the refund completed.
    pub fn is_success(&self) -> bool {
        matches!(self.info.get_str("refund_status"), Ok(SUCCESS))
    }

    /// Completion time, when the refund succeeded.
    pub fn success_time(&self) -> Result<Option<&str>> {
        self.info.opt_str("success_time")
    }
}

/// Identity a notification must belong to.
#[derive(Clone, Copy)]
pub struct Recipient<'a> {
    /// Expected `appid`.
    pub app_id: &'a str,
    /// Expected `mch_id`.
    pub mch_id: &'a str,
    /// Merchant API key (decryption and optional signature check).
    pub api_key: &'a str,
    /// Algorithm used if the envelope carries a `sign` field.
    pub sign_type: SignType,
}

impl std::fmt::Debug for Recipient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recipient")
            .field("app_id", &self.app_id)
            .field("mch_id", &self.mch_id)
            .field("sign_type", &self.sign_type)
            .finish_non_exhaustive()
    }
}

/// Decode, check and decrypt a refund notification body.
pub fn open_refund_notification(
    body: &[u8],
    recipient: &Recipient<'_>,
) -> Result<RefundNotification> {
    let envelope = xml::decode(body, &REFUND_NOTIFY_ENVELOPE)?;

    match envelope.opt_str("return_code")? {
        Some(SUCCESS) => {}
        Some(_) => {
            return Err(WxPayError::ReturnFailed {
                message: envelope.opt_str("return_msg")?.unwrap_or_default().to_string(),
            })
        }
        None => return Err(WxPayError::MissingStatus("return_code")),
    }

    check_identity(&envelope, "appid", recipient.app_id)?;
    check_identity(&envelope, "mch_id", recipient.mch_id)?;

    let envelope = if envelope.contains(SIGN_KEY) {
        let sign_type = SignType::from_params(&envelope, recipient.sign_type)?;
        SignedEnvelope::open(envelope, recipient.api_key, sign_type)?.into_params()
    } else {
        envelope
    };

    let req_info = match envelope.opt_str("req_info")? {
        Some(value) if !value.is_empty() => value,
        _ => return Err(WxPayError::MissingReqInfo),
    };

    let plaintext = encryption::decrypt_req_info(req_info, recipient.api_key)?;
    let info = xml::decode(&plaintext, &REFUND_NOTIFY_INFO)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(fields = info.len(), "refund notification decrypted");

    Ok(RefundNotification { envelope, info })
}

fn check_identity(envelope: &Params, field: &'static str, expected: &str) -> Result<()> {
    match envelope.opt_str(field)? {
        Some(actual) if actual != expected => Err(WxPayError::IdentityMismatch {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Build the reply document for a notification.
///
/// `Ok(())` acknowledges with `SUCCESS`/`OK`; an error is reported as `FAIL`
/// with its message, which makes the gateway redeliver later.
pub fn ack<T>(outcome: &Result<T>) -> Result<Vec<u8>> {
    let mut reply = Params::new();
    match outcome {
        Ok(_) => reply.add("return_code", SUCCESS).add("return_msg", "OK"),
        Err(err) => reply.add("return_code", FAIL).add("return_msg", err.to_string()),
    };
    xml::encode(&reply, NOTIFY_ACK.root)
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_ID: &str = "wx2421b1c4370ec43b";
    const MCH_ID: &str = "10000100";
    const API_KEY: &str = "192006250b4c09247ec02edce69f6a2d";

    fn recipient() -> Recipient<'static> {
        Recipient {
            app_id: APP_ID,
            mch_id: MCH_ID,
            api_key: API_KEY,
            sign_type: SignType::Md5,
        }
    }

    fn inner_doc() -> Vec<u8> {
        let mut info = Params::new();
        info.add("transaction_id", "4200000001")
            .add("out_trade_no", "T1")
            .add("refund_id", "5000000001")
            .add("out_refund_no", "R1")
            .add("total_fee", 100)
            .add("refund_fee", 40)
            .add("settlement_refund_fee", 40)
            .add("refund_status", "SUCCESS")
            .add("success_time", "2026-10-19 10:00:00")
            .add("refund_recv_accout", "balance")
            .add("refund_account", "REFUND_SOURCE_RECHARGE_FUNDS")
            .add("refund_request_source", "API");
        xml::encode(&info, REFUND_NOTIFY_INFO.root).unwrap()
    }

    fn envelope_with(req_info: Option<String>) -> Params {
        let mut envelope = Params::new();
        envelope
            .add("return_code", SUCCESS)
            .add("appid", APP_ID)
            .add("mch_id", MCH_ID)
            .add("nonce_str", "TeqClE3i0mvn3DrK");
        if let Some(req_info) = req_info {
            envelope.add("req_info", req_info);
        }
        envelope
    }

    fn body(envelope: &Params) -> Vec<u8> {
        xml::encode(envelope, "xml").unwrap()
    }

    #[test]
    fn test_open_valid_notification() {
        let req_info = encryption::encrypt_req_info(&inner_doc(), API_KEY).unwrap();
        let notification =
            open_refund_notification(&body(&envelope_with(Some(req_info))), &recipient())
                .unwrap();

        assert_eq!(notification.out_refund_no().unwrap(), "R1");
        assert_eq!(notification.refund_fee().unwrap(), 40);
        assert_eq!(notification.total_fee().unwrap(), 100);
        assert!(notification.is_success());
        assert_eq!(
            notification.success_time().unwrap(),
            Some("2026-10-19 10:00:00")
        );
        assert_eq!(notification.envelope.get_str("mch_id").unwrap(), MCH_ID);
        // outer and inner key sets are disjoint
        assert!(!notification.info.contains("req_info"));
        assert!(!notification.envelope.contains("refund_fee"));
    }

    #[test]
    fn test_missing_req_info_is_distinct() {
        let err = open_refund_notification(&body(&envelope_with(None)), &recipient()).unwrap_err();
        assert!(matches!(err, WxPayError::MissingReqInfo));

        let err = open_refund_notification(&body(&envelope_with(Some(String::new()))), &recipient())
            .unwrap_err();
        assert!(matches!(err, WxPayError::MissingReqInfo));
    }

    #[test]
    fn test_return_code_fail() {
        let mut envelope = envelope_with(None);
        envelope.add("return_code", FAIL).add("return_msg", "bad");
        let err = open_refund_notification(&body(&envelope), &recipient()).unwrap_err();
        assert_eq!(err.to_string(), "bad");
    }

    #[test]
    fn test_foreign_merchant_rejected() {
        let req_info = encryption::encrypt_req_info(&inner_doc(), API_KEY).unwrap();
        let mut envelope = envelope_with(Some(req_info));
        envelope.add("mch_id", "99999999");
        let err = open_refund_notification(&body(&envelope), &recipient()).unwrap_err();
        assert!(matches!(
            err,
            WxPayError::IdentityMismatch { field: "mch_id", .. }
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let req_info = encryption::encrypt_req_info(&inner_doc(), "another-key").unwrap();
        let result = open_refund_notification(&body(&envelope_with(Some(req_info))), &recipient());
        assert!(matches!(
            result,
            Err(WxPayError::Padding) | Err(WxPayError::Xml(_))
        ));
    }

    #[test]
    fn test_corrupted_last_block_fails() {
        let mut raw = encryption::encrypt(&inner_doc(), &encryption::derive_key(API_KEY)).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x5a;
        let req_info = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, raw);

        let result = open_refund_notification(&body(&envelope_with(Some(req_info))), &recipient());
        assert!(matches!(
            result,
            Err(WxPayError::Padding) | Err(WxPayError::Xml(_))
        ));
    }

    #[test]
    fn test_signed_envelope_is_verified() {
        let req_info = encryption::encrypt_req_info(&inner_doc(), API_KEY).unwrap();
        let sealed = SignedEnvelope::seal(envelope_with(Some(req_info)), API_KEY, SignType::Md5);
        assert!(open_refund_notification(&body(sealed.params()), &recipient()).is_ok());

        let mut forged = sealed.into_params();
        forged.add("nonce_str", "changed");
        assert!(matches!(
            open_refund_notification(&body(&forged), &recipient()),
            Err(WxPayError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_ack_documents() {
        let ok = ack(&Ok::<(), WxPayError>(())).unwrap();
        assert_eq!(
            String::from_utf8(ok).unwrap(),
            "<xml><return_code>SUCCESS</return_code><return_msg>OK</return_msg></xml>"
        );

        let failed = ack(&Err::<(), _>(WxPayError::MissingReqInfo)).unwrap();
        let reply = xml::decode(&failed, &NOTIFY_ACK).unwrap();
        assert_eq!(reply.get_str("return_code").unwrap(), FAIL);
        assert_eq!(
            reply.get_str("return_msg").unwrap(),
            "notification without req_info"
        );
    }
}
