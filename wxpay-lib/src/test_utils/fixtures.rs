//! Gateway documents for tests.
//!
//! Each helper produces the bytes the gateway would send, signed or encrypted
//! with the given key so they pass (or deliberately fail) client checks.

use crate::notify::encryption;
use crate::params::schema::REFUND_NOTIFY_INFO;
use crate::params::Params;
use crate::signing::{SignType, SignedEnvelope};
use crate::xml;

/// Commonly used account values.
pub struct TestFixtures;

impl TestFixtures {
    /// Application id.
    pub const APP_ID: &'static str = "wx2421b1c4370ec43b";
    /// Merchant id.
    pub const MCH_ID: &'static str = "10000100";
    /// Merchant API key (the gateway's documentation example).
    pub const API_KEY: &'static str = "192006250b4c09247ec02edce69f6a2d";
    /// Nonce used in canned responses.
    pub const NONCE: &'static str = "5K8264ILTKCH16CQ2502SI8ZNMTM67VS";
}

fn encode(params: &Params) -> Vec<u8> {
    match xml::encode(params, "xml") {
        Ok(bytes) => bytes,
        Err(err) => panic!("fixture encoding failed: {err}"),
    }
}

fn success_envelope(fields: &Params) -> Params {
    let mut params = Params::new();
    params
        .add("return_code", "SUCCESS")
        .add("return_msg", "OK")
        .add("result_code", "SUCCESS")
        .add("appid", TestFixtures::APP_ID)
        .add("mch_id", TestFixtures::MCH_ID)
        .add("nonce_str", TestFixtures::NONCE)
        .merge(fields);
    params
}

/// Successful response carrying `fields`, signed with `key`.
pub fn signed_success(fields: &Params, key: &str, sign_type: SignType) -> Vec<u8> {
    let sealed = SignedEnvelope::seal(success_envelope(fields), key, sign_type);
    encode(sealed.params())
}

/// Successful response carrying `fields` and an arbitrary `sign` value.
pub fn with_signature(fields: &Params, signature: &str) -> Vec<u8> {
    let mut params = success_envelope(fields);
    params.add("sign", signature);
    encode(&params)
}

/// Communication-level failure (`return_code=FAIL`), unsigned.
pub fn return_failed(message: &str) -> Vec<u8> {
    let mut params = Params::new();
    params.add("return_code", "FAIL").add("return_msg", message);
    encode(&params)
}

/// Business-level failure (`result_code=FAIL`), signed with `key`.
pub fn result_failed(key: &str, err_code: &str, err_code_des: &str) -> Vec<u8> {
    let mut fields = Params::new();
    fields
        .add("result_code", "FAIL")
        .add("err_code", err_code)
        .add("err_code_des", err_code_des);
    signed_success(&fields, key, SignType::Md5)
}

/// Decrypted body of a successful refund notification.
pub fn refund_info(out_refund_no: &str, refund_fee: i64) -> Params {
    let mut info = Params::new();
    info.add("transaction_id", "4200000215201906154568978841")
        .add("out_trade_no", "T1")
        .add("refund_id", "50000000382019052709732678859")
        .add("out_refund_no", out_refund_no)
        .add("total_fee", refund_fee * 2)
        .add("refund_fee", refund_fee)
        .add("settlement_refund_fee", refund_fee)
        .add("refund_status", "SUCCESS")
        .add("success_time", "2019-06-15 10:44:30")
        .add("refund_recv_accout", "Balance")
        .add("refund_account", "REFUND_SOURCE_UNSETTLED_FUNDS")
        .add("refund_request_source", "API");
    info
}

/// Refund notification addressed to the fixture account, `info` encrypted with `key`.
pub fn refund_notification(info: &Params, key: &str) -> Vec<u8> {
    let inner = match xml::encode(info, REFUND_NOTIFY_INFO.root) {
        Ok(bytes) => bytes,
        Err(err) => panic!("fixture encoding failed: {err}"),
    };
    let req_info = match encryption::encrypt_req_info(&inner, key) {
        Ok(text) => text,
        Err(err) => panic!("fixture encryption failed: {err}"),
    };

    let mut envelope = Params::new();
    envelope
        .add("return_code", "SUCCESS")
        .add("appid", TestFixtures::APP_ID)
        .add("mch_id", TestFixtures::MCH_ID)
        .add("nonce_str", TestFixtures::NONCE)
        .add("req_info", req_info);
    encode(&envelope)
}
