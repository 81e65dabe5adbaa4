//! Static field tables for each gateway message.
//!
//! A [`Schema`] lists every field a message may carry as a
//! `(key, kind, presence)` triple. The validator reads the presence column to
//! build its must/one-of/optional sets; the XML codec reads the kind column to
//! type decoded values.

use super::SIGN_KEY;

/// Value type of a field on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Text.
    Str,
    /// Decimal integer.
    Int,
    /// Base64 text carrying raw bytes.
    Bytes,
}

/// Presence rule of a request field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    /// Always required.
    Must,
    /// Exactly one field of the one-of group is required.
    OneOf,
    /// May be present.
    Optional,
}

/// One row of a field table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Element name / bag key.
    pub key: &'static str,
    /// Value type.
    pub kind: FieldKind,
    /// Presence rule.
    pub presence: Presence,
    /// Whether the gateway repeats the field with `_<n>` suffixes (`refund_fee_0`).
    pub indexed: bool,
}

impl Field {
    /// Required string field.
    pub const fn must(key: &'static str) -> Self {
        Self::new(key, FieldKind::Str, Presence::Must)
    }

    /// Required integer field.
    pub const fn must_int(key: &'static str) -> Self {
        Self::new(key, FieldKind::Int, Presence::Must)
    }

    /// One-of string field.
    pub const fn one_of(key: &'static str) -> Self {
        Self::new(key, FieldKind::Str, Presence::OneOf)
    }

    /// Optional string field.
    pub const fn optional(key: &'static str) -> Self {
        Self::new(key, FieldKind::Str, Presence::Optional)
    }

    /// Optional integer field.
    pub const fn optional_int(key: &'static str) -> Self {
        Self::new(key, FieldKind::Int, Presence::Optional)
    }

    /// Indexed integer field (`coupon_refund_fee_0_1` resolves to `coupon_refund_fee`).
    pub const fn indexed_int(key: &'static str) -> Self {
        let mut field = Self::new(key, FieldKind::Int, Presence::Optional);
        field.indexed = true;
        field
    }

    /// Indexed string field.
    pub const fn indexed(key: &'static str) -> Self {
        let mut field = Self::new(key, FieldKind::Str, Presence::Optional);
        field.indexed = true;
        field
    }

    const fn new(key: &'static str, kind: FieldKind, presence: Presence) -> Self {
        Self {
            key,
            kind,
            presence,
            indexed: false,
        }
    }
}

/// Field table of one message type.
#[derive(Clone, Copy, Debug)]
pub struct Schema {
    /// Root element name used when encoding.
    pub root: &'static str,
    /// Fields in declaration order.
    pub fields: &'static [Field],
}

impl Schema {
    /// Find the row for `key`, resolving indexed names to their base field.
    pub fn field(&self, key: &str) -> Option<&Field> {
        if let Some(field) = self.fields.iter().find(|f| f.key == key) {
            return Some(field);
        }
        let base = strip_index(key)?;
        self.fields.iter().find(|f| f.indexed && f.key == base)
    }

    /// Wire type of `key`; unknown fields are strings.
    pub fn kind_of(&self, key: &str) -> FieldKind {
        self.field(key).map_or(FieldKind::Str, |f| f.kind)
    }

    /// Keys of the given presence class, in declaration order.
    pub fn keys_with(&self, presence: Presence) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(move |f| f.presence == presence)
            .map(|f| f.key)
    }

    /// Whether `key` is accepted in an outbound message of this type.
    pub fn allows(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }
}

/// `coupon_refund_fee_0_1` -> `coupon_refund_fee`; `None` when there is no numeric suffix.
fn strip_index(key: &str) -> Option<&str> {
    let mut base = key;
    while let Some((head, tail)) = base.rsplit_once('_') {
        if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        base = head;
    }
    (base.len() != key.len() && !base.is_empty()).then_some(base)
}

/// Request: unified order (`/pay/unifiedorder`).
pub const UNIFIED_ORDER_REQUEST: Schema = Schema {
    root: "xml",
    fields: &[
        Field::must("appid"),
        Field::must("mch_id"),
        Field::must("nonce_str"),
        Field::must(SIGN_KEY),
        Field::must("body"),
        Field::must("out_trade_no"),
        Field::must_int("total_fee"),
        Field::must("spbill_create_ip"),
        Field::must("notify_url"),
        Field::must("trade_type"),
        Field::optional("device_info"),
        Field::optional("sign_type"),
        Field::optional("detail"),
        Field::optional("attach"),
        Field::optional("fee_type"),
        Field::optional("time_start"),
        Field::optional("time_expire"),
        Field::optional("goods_tag"),
        Field::optional("limit_pay"),
        Field::optional("receipt"),
        Field::optional("openid"),
        Field::optional("product_id"),
        Field::optional("scene_info"),
    ],
};

/// Response: unified order.
pub const UNIFIED_ORDER_RESPONSE: Schema = Schema {
    root: "xml",
    fields: &[
        Field::optional("return_code"),
        Field::optional("return_msg"),
        Field::optional("appid"),
        Field::optional("mch_id"),
        Field::optional("device_info"),
        Field::optional("nonce_str"),
        Field::optional(SIGN_KEY),
        Field::optional("result_code"),
        Field::optional("err_code"),
        Field::optional("err_code_des"),
        Field::optional("trade_type"),
        Field::optional("prepay_id"),
        Field::optional("code_url"),
        Field::optional("mweb_url"),
    ],
};

/// Request: order query (`/pay/orderquery`).
pub const ORDER_QUERY_REQUEST: Schema = Schema {
    root: "xml",
    fields: &[
        Field::must("appid"),
        Field::must("mch_id"),
        Field::must("nonce_str"),
        Field::must(SIGN_KEY),
        Field::one_of("transaction_id"),
        Field::one_of("out_trade_no"),
        Field::optional("sign_type"),
    ],
};

/// Response: order query.
pub const ORDER_QUERY_RESPONSE: Schema = Schema {
    root: "xml",
    fields: &[
        Field::optional("return_code"),
        Field::optional("return_msg"),
        Field::optional("result_code"),
        Field::optional("err_code"),
        Field::optional("err_code_des"),
        Field::optional("trade_state"),
        Field::optional("trade_state_desc"),
        Field::optional("transaction_id"),
        Field::optional("out_trade_no"),
        Field::optional_int("total_fee"),
        Field::optional_int("settlement_total_fee"),
        Field::optional_int("cash_fee"),
        Field::optional_int("coupon_count"),
        Field::indexed_int("coupon_fee"),
        Field::indexed("coupon_id"),
        Field::indexed("coupon_type"),
        Field::optional("time_end"),
    ],
};

/// Request: refund query (`/pay/refundquery`).
pub const REFUND_QUERY_REQUEST: Schema = Schema {
    root: "xml",
    fields: &[
        Field::must("appid"),
        Field::must("mch_id"),
        Field::must("nonce_str"),
        Field::must(SIGN_KEY),
        Field::one_of("transaction_id"),
        Field::one_of("out_trade_no"),
        Field::one_of("out_refund_no"),
        Field::one_of("refund_id"),
        Field::optional("sign_type"),
        Field::optional_int("offset"),
    ],
};

/// Response: refund query.
pub const REFUND_QUERY_RESPONSE: Schema = Schema {
    root: "xml",
    fields: &[
        Field::optional("return_code"),
        Field::optional("return_msg"),
        Field::optional("result_code"),
        Field::optional("err_code"),
        Field::optional("err_code_des"),
        Field::optional("transaction_id"),
        Field::optional("out_trade_no"),
        Field::optional_int("total_fee"),
        Field::optional_int("settlement_total_fee"),
        Field::optional_int("cash_fee"),
        Field::optional_int("refund_count"),
        Field::optional_int("total_refund_count"),
        Field::indexed("out_refund_no"),
        Field::indexed("refund_id"),
        Field::indexed("refund_channel"),
        Field::indexed_int("refund_fee"),
        Field::indexed_int("settlement_refund_fee"),
        Field::indexed_int("coupon_refund_fee"),
        Field::indexed_int("coupon_refund_count"),
        Field::indexed("coupon_refund_id"),
        Field::indexed("refund_status"),
        Field::indexed("refund_account"),
        Field::indexed("refund_recv_accout"),
        Field::indexed("refund_success_time"),
    ],
};

/// Notification envelope: refund result (outer document).
pub const REFUND_NOTIFY_ENVELOPE: Schema = Schema {
    root: "xml",
    fields: &[
        Field::optional("return_code"),
        Field::optional("return_msg"),
        Field::optional("appid"),
        Field::optional("mch_id"),
        Field::optional("nonce_str"),
        Field::optional("req_info"),
    ],
};

/// Notification payload: decrypted `req_info` document.
pub const REFUND_NOTIFY_INFO: Schema = Schema {
    root: "root",
    fields: &[
        Field::optional("transaction_id"),
        Field::optional("out_trade_no"),
        Field::optional("refund_id"),
        Field::optional("out_refund_no"),
        Field::optional_int("total_fee"),
        Field::optional_int("settlement_total_fee"),
        Field::optional_int("refund_fee"),
        Field::optional_int("settlement_refund_fee"),
        Field::optional("refund_status"),
        Field::optional("success_time"),
        Field::optional("refund_recv_accout"),
        Field::optional("refund_account"),
        Field::optional("refund_request_source"),
    ],
};

/// Reply document acknowledging a notification.
pub const NOTIFY_ACK: Schema = Schema {
    root: "xml",
    fields: &[Field::must("return_code"), Field::optional("return_msg")],
};
