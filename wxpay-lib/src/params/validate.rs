//! Parameter-set validation against a request [`Schema`].
//!
//! Rules are checked in a fixed order and the first violation is returned:
//!
//! 1. one-of group: exactly one member present
//! 2. every `Must` field (except `sign`) present
//! 3. every present key belongs to the schema

use super::schema::{Presence, Schema};
use super::{Params, SIGN_KEY};
use crate::{Result, WxPayError};

/// Check `params` against the presence rules of `schema`.
pub fn validate(params: &Params, schema: &Schema) -> Result<()> {
    check_one_of(params, schema)?;

    for key in schema.keys_with(Presence::Must) {
        if key == SIGN_KEY {
            continue;
        }
        if !params.contains(key) {
            return Err(WxPayError::MissingParam(key.to_string()));
        }
    }

    if let Some(key) = params.keys().find(|key| !schema.allows(key)) {
        return Err(WxPayError::UnexpectedParam(key.to_string()));
    }

    Ok(())
}

fn check_one_of(params: &Params, schema: &Schema) -> Result<()> {
    let group: Vec<&str> = schema.keys_with(Presence::OneOf).collect();
    if group.is_empty() {
        return Ok(());
    }

    match group.iter().filter(|key| params.contains(key)).count() {
        1 => Ok(()),
        0 => Err(WxPayError::MissingOneOf(owned(&group))),
        _ => Err(WxPayError::ConflictingParams(owned(&group))),
    }
}

fn owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}
