//! Parameter bag shared by requests, responses and notifications.
//!
//! [`Params`] maps string keys to a small closed set of value types. Keys are
//! kept in byte-wise ascending order, which is the order the canonical signer
//! needs.
//!
//! # Example
//!
//! ```
//! use wxpay_lib::Params;
//!
//! let mut params = Params::new();
//! params.add("out_trade_no", "T1").add("total_fee", 100);
//!
//! assert_eq!(params.get_str("out_trade_no").unwrap(), "T1");
//! assert_eq!(params.get_int("total_fee").unwrap(), 100);
//! ```

pub mod schema;
pub mod validate;

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{Result, WxPayError};

/// Key under which the message signature travels.
pub const SIGN_KEY: &str = "sign";

/// Key selecting the signature algorithm.
pub const SIGN_TYPE_KEY: &str = "sign_type";

/// A single parameter value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    /// Text value.
    Str(String),
    /// Integer value (fees, counts). Rendered in decimal.
    Int(i64),
    /// Raw bytes. Rendered as standard base64.
    Bytes(Vec<u8>),
}

impl ParamValue {
    /// Name of the value's type, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "a string",
            Self::Int(_) => "an integer",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Whether the value stringifies to the empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            Self::Int(_) => false,
            Self::Bytes(b) => b.is_empty(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{}", n),
            Self::Bytes(b) => f.write_str(&STANDARD.encode(b)),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for ParamValue {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        Self::Int(n.into())
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<&[u8]> for ParamValue {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

/// Ordered key/value parameter bag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    entries: BTreeMap<String, ParamValue>,
}

impl Params {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Remove a value, returning it if it was present.
    pub fn delete(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.remove(key)
    }

    /// Whether the key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys, in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over entries in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry of `other` into this bag, overwriting on conflict.
    pub fn merge(&mut self, other: &Params) -> &mut Self {
        for (key, value) in other.iter() {
            self.entries.insert(key.clone(), value.clone());
        }
        self
    }

    /// `(key, stringified value)` pairs in ascending key order, skipping `exclude`.
    pub fn sorted_pairs(&self, exclude: &str) -> Vec<(&str, String)> {
        self.entries
            .iter()
            .filter(|(key, _)| key.as_str() != exclude)
            .map(|(key, value)| (key.as_str(), value.to_string()))
            .collect()
    }

    /// Read a string value.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(ParamValue::Str(s)) => Ok(s),
            Some(_) => Err(type_mismatch(key, "a string")),
            None => Err(WxPayError::MissingField(key.to_string())),
        }
    }

    /// Read an integer value.
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.get(key) {
            Some(ParamValue::Int(n)) => Ok(*n),
            Some(_) => Err(type_mismatch(key, "an integer")),
            None => Err(WxPayError::MissingField(key.to_string())),
        }
    }

    /// Read a bytes value.
    pub fn get_bytes(&self, key: &str) -> Result<&[u8]> {
        match self.get(key) {
            Some(ParamValue::Bytes(b)) => Ok(b),
            Some(_) => Err(type_mismatch(key, "bytes")),
            None => Err(WxPayError::MissingField(key.to_string())),
        }
    }

    /// Read a string value, treating absence as `None`.
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.get_str(key).map(Some),
        }
    }
}

fn type_mismatch(key: &str, expected: &'static str) -> WxPayError {
    WxPayError::TypeMismatch {
        field: key.to_string(),
        expected,
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.add(key, value);
        }
        params
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_overwrites() {
        let mut params = Params::new();
        params.add("total_fee", 1).add("total_fee", 2);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get_int("total_fee").unwrap(), 2);
    }

    #[test]
    fn test_delete() {
        let mut params = Params::new();
        params.add("attach", "x");
        assert_eq!(params.delete("attach"), Some(ParamValue::from("x")));
        assert!(params.delete("attach").is_none());
        assert!(params.is_empty());
    }

    #[test]
    fn test_keys_are_sorted_bytewise() {
        let params: Params = [("mch_id", "m"), ("appid", "a"), ("Zeta", "z"), ("a_b", "x")]
            .into_iter()
            .collect();
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["Zeta", "a_b", "appid", "mch_id"]);
    }

    #[test]
    fn test_sorted_pairs_excludes_key_and_stringifies() {
        let mut params = Params::new();
        params
            .add("sign", "ABC")
            .add("total_fee", 101)
            .add("blob", vec![1u8, 2, 3])
            .add("body", "coffee");
        let pairs = params.sorted_pairs(SIGN_KEY);
        assert_eq!(
            pairs,
            vec![
                ("blob", "AQID".to_string()),
                ("body", "coffee".to_string()),
                ("total_fee", "101".to_string()),
            ]
        );
    }

    #[test]
    fn test_typed_reads() {
        let mut params = Params::new();
        params.add("total_fee", 1).add("body", "b");

        assert!(matches!(
            params.get_str("total_fee"),
            Err(WxPayError::TypeMismatch { .. })
        ));
        assert!(matches!(
            params.get_int("missing"),
            Err(WxPayError::MissingField(ref k)) if k == "missing"
        ));
        assert_eq!(params.opt_str("missing").unwrap(), None);
        assert_eq!(params.opt_str("body").unwrap(), Some("b"));
        assert!(params.get_bytes("body").is_err());
    }

    #[test]
    fn test_merge_overwrites_on_conflict() {
        let mut base: Params = [("appid", "a"), ("attach", "x")].into_iter().collect();
        let other: Params = [("attach", "y"), ("detail", "d")].into_iter().collect();
        base.merge(&other);
        assert_eq!(base.get_str("attach").unwrap(), "y");
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_empty_values() {
        assert!(ParamValue::from("").is_empty());
        assert!(ParamValue::Bytes(Vec::new()).is_empty());
        assert!(!ParamValue::Int(0).is_empty());
    }
}
