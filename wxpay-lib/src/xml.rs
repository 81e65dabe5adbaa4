//! Flat XML wire codec.
//!
//! The gateway exchanges documents of the shape
//!
//! ```text
//! <xml>
//!   <appid>wx1</appid>
//!   <total_fee>100</total_fee>
//!   <return_msg><![CDATA[OK]]></return_msg>
//! </xml>
//! ```
//!
//! one child element per field. Decoding types each value through a
//! [`Schema`]; fields the schema does not know are kept as strings.

use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::params::schema::{FieldKind, Schema};
use crate::params::{ParamValue, Params};
use crate::{Result, WxPayError};

/// Content type of every outbound document.
pub const CONTENT_TYPE: &str = "application/xml;charset=utf-8";

/// Serialize `params` under a `root` element.
pub fn encode(params: &Params, root: &str) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new(root)))?;
    for (key, value) in params {
        let text = value.to_string();
        writer.write_event(Event::Start(BytesStart::new(key.as_str())))?;
        writer.write_event(Event::Text(BytesText::new(&text)))?;
        writer.write_event(Event::End(BytesEnd::new(key.as_str())))?;
    }
    writer.write_event(Event::End(BytesEnd::new(root)))?;
    Ok(writer.into_inner())
}

/// Parse a flat document into a bag typed by `schema`.
///
/// Fails on malformed or unterminated input, on nesting deeper than one level
/// below the root, and on values that do not fit their schema type.
///
/// Field text is kept exactly as received, so a decoded bag signs to the same
/// canonical string the sender signed. Typed values must therefore be in
/// canonical form: `007` or `+5` is rejected rather than re-rendered as `7`.
pub fn decode(bytes: &[u8], schema: &Schema) -> Result<Params> {
    let mut reader = Reader::from_reader(bytes);

    let mut params = Params::new();
    let mut seen_root = false;
    // Name and accumulated text of the field element currently open.
    let mut current: Option<(String, String)> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                depth += 1;
                match depth {
                    1 if seen_root => return Err(xml_error("multiple root elements")),
                    1 => seen_root = true,
                    2 => current = Some((element_name(start.name().as_ref())?, String::new())),
                    _ => return Err(xml_error("nested element in flat document")),
                }
            }
            Event::Empty(start) => match depth {
                0 if seen_root => return Err(xml_error("multiple root elements")),
                0 => seen_root = true,
                1 => {
                    let name = element_name(start.name().as_ref())?;
                    insert(&mut params, schema, name, String::new())?;
                }
                _ => return Err(xml_error("nested element in flat document")),
            },
            Event::Text(text) => {
                let text = text.unescape()?;
                match current.as_mut() {
                    Some((_, buf)) => buf.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(xml_error("text outside field element")),
                }
            }
            Event::CData(data) => match current.as_mut() {
                Some((_, buf)) => buf.push_str(&utf8(data.into_inner())?),
                None => return Err(xml_error("CDATA outside field element")),
            },
            Event::End(_) => {
                if depth == 2 {
                    if let Some((name, text)) = current.take() {
                        insert(&mut params, schema, name, text)?;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(xml_error("empty document"));
    }
    if depth != 0 {
        return Err(xml_error("unterminated document"));
    }
    Ok(params)
}

fn insert(params: &mut Params, schema: &Schema, name: String, text: String) -> Result<()> {
    if let Some(c) = text.chars().find(|&c| !is_xml_char(c)) {
        return Err(xml_error(format!(
            "field `{}` contains illegal character {:?}",
            name, c
        )));
    }
    let value = match schema.kind_of(&name) {
        FieldKind::Str => ParamValue::Str(text),
        FieldKind::Int => match text.parse::<i64>() {
            Ok(n) if n.to_string() == text => ParamValue::Int(n),
            _ => {
                return Err(xml_error(format!(
                    "field `{}` is not a canonical integer: {:?}",
                    name, text
                )))
            }
        },
        FieldKind::Bytes => match STANDARD.decode(&text) {
            Ok(raw) if STANDARD.encode(&raw) == text => ParamValue::Bytes(raw),
            _ => {
                return Err(xml_error(format!(
                    "field `{}` is not canonical base64: {:?}",
                    name, text
                )))
            }
        },
    };
    params.add(name, value);
    Ok(())
}

/// The XML 1.0 `Char` production; Rust `char` already excludes surrogates.
fn is_xml_char(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => true,
        '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => false,
        _ => true,
    }
}

fn element_name(raw: &[u8]) -> Result<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| xml_error(e.to_string()))
}

fn utf8(raw: Cow<'_, [u8]>) -> Result<String> {
    String::from_utf8(raw.into_owned()).map_err(|e| xml_error(e.to_string()))
}

fn xml_error(msg: impl Into<String>) -> WxPayError {
    WxPayError::Xml(msg.into())
}
