//! Decoder for the persisted shard format.
//!
//! A shard resource is a small script assigning one array literal:
//!
//! ```text
//! var searchData_me=
//! [
//!   ['memory_20mapping_12',['Memory mapping',['../memory_mapping.html',1,'index']]],
//!   ['memory_20pools_3',['../custom_memory_pools.html','Custom memory pools','page']]
//! ];
//! ```
//!
//! Each element is `[escaped key, occurrence data]`. Keys use search-id
//! escaping (ASCII alphanumerics kept, every other byte written as `_xx`)
//! followed by a `_<n>` uniqueness suffix. Occurrence data comes in several
//! shapes; all of them are normalized here into a plain list of
//! [`Occurrence`] values so nothing downstream looks at the shape again.

use crate::error::ShardError;
use crate::index::types::{Occurrence, SearchEntry, Shard};
use crate::utils::{decode_entities, fold_case};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Variable name used by generators that do not qualify it with the bucket
const LEGACY_VARIABLE: &str = "searchData";

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^\s*var\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*").expect("static regex")
    })
}

/// Escape text into search-id form
pub fn escape_search_id(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if b.is_ascii_alphanumeric() {
            out.push(b as char);
        } else {
            out.push_str(&format!("_{:02x}", b));
        }
    }
    out
}

/// Variable name a shard for `bucket` assigns to
pub fn variable_name(bucket: &str) -> String {
    format!("{}_{}", LEGACY_VARIABLE, escape_search_id(bucket))
}

/// File name of the shard resource for `bucket`
pub fn resource_name(bucket: &str) -> String {
    format!("{}.js", escape_search_id(bucket))
}

/// Decode an escaped key: strip the uniqueness suffix, undo search-id
/// escaping, decode HTML entities and fold case.
///
/// A key without a trailing `_<digits>` suffix is decoded as a whole.
pub fn decode_key(escaped: &str) -> String {
    let body = match escaped.rfind('_') {
        Some(pos)
            if pos + 1 < escaped.len()
                && escaped[pos + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &escaped[..pos]
        }
        _ => escaped,
    };

    let bytes = body.as_bytes();
    let mut raw = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_'
            && i + 2 < bytes.len()
            && let Some(byte) = hex_byte(bytes[i + 1], bytes[i + 2])
        {
            raw.push(byte);
            i += 3;
            continue;
        }
        raw.push(bytes[i]);
        i += 1;
    }

    let text = String::from_utf8_lossy(&raw);
    fold_case(&decode_entities(&text))
}

fn hex_byte(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Decode a shard payload into a [`Shard`] (sorted, unique keys).
pub fn decode_shard(bucket: &str, payload: &str) -> Result<Shard, ShardError> {
    let entries = decode_entries(bucket, payload)?;
    Ok(Shard::from_entries(bucket, entries))
}

/// Decode a shard payload into entries in file order, without sorting or
/// merging. Used by the checker to report generator contract violations.
pub fn decode_entries(bucket: &str, payload: &str) -> Result<Vec<SearchEntry>, ShardError> {
    let caps = header_regex()
        .captures(payload)
        .ok_or_else(|| ShardError::malformed(bucket, "missing `var <name> =` header"))?;

    let name = &caps[1];
    if name != LEGACY_VARIABLE && name != variable_name(bucket) {
        return Err(ShardError::malformed(
            bucket,
            format!("unexpected variable name '{}'", name),
        ));
    }

    let body = payload[caps.get(0).map_or(0, |m| m.end())..]
        .trim_end()
        .trim_end_matches(';');

    let json = script_to_json(body).map_err(|reason| ShardError::malformed(bucket, reason))?;
    let elements: Vec<Value> = serde_json::from_str(&json)
        .map_err(|e| ShardError::malformed(bucket, format!("invalid array literal: {}", e)))?;

    elements
        .iter()
        .enumerate()
        .map(|(i, element)| {
            decode_element(element).map_err(|reason| {
                ShardError::malformed(bucket, format!("element {}: {}", i, reason))
            })
        })
        .collect()
}

fn decode_element(element: &Value) -> Result<SearchEntry, String> {
    let pair = element.as_array().ok_or("expected [key, data]")?;
    let [key, data] = pair.as_slice() else {
        return Err(format!("expected 2 items, found {}", pair.len()));
    };

    let key = key.as_str().ok_or("key is not a string")?;
    let occurrences = decode_occurrences(data)?;
    if occurrences.is_empty() {
        return Err("no occurrences".to_string());
    }

    Ok(SearchEntry::new(decode_key(key), occurrences))
}

fn decode_occurrences(data: &Value) -> Result<Vec<Occurrence>, String> {
    let items = data.as_array().ok_or("occurrence data is not an array")?;

    match items.split_first() {
        // [url, label] or [url, label, category]
        _ if !items.is_empty() && items.iter().all(Value::is_string) => {
            Ok(vec![decode_pair(items)?])
        }
        // [[url, label], [url, label, category], ...]
        _ if !items.is_empty() && items.iter().all(Value::is_array) => items
            .iter()
            .map(|item| decode_pair(item.as_array().map(Vec::as_slice).unwrap_or_default()))
            .collect(),
        // [label, [url, flag, scope], ...]
        Some((Value::String(label), children))
            if !children.is_empty() && children.iter().all(Value::is_array) =>
        {
            decode_labelled(label, children)
        }
        _ => Err("unrecognized occurrence shape".to_string()),
    }
}

fn decode_pair(items: &[Value]) -> Result<Occurrence, String> {
    let strings: Vec<&str> = items
        .iter()
        .map(|v| v.as_str().ok_or("occurrence field is not a string"))
        .collect::<Result<_, _>>()?;

    match strings.as_slice() {
        [url, label] => Ok(Occurrence::new(*url, decode_entities(label))),
        [url, label, category] => {
            let occ = Occurrence::new(*url, decode_entities(label));
            Ok(match non_empty(category) {
                Some(cat) => occ.with_category(cat),
                None => occ,
            })
        }
        other => Err(format!("occurrence has {} fields", other.len())),
    }
}

fn decode_labelled(label: &str, children: &[Value]) -> Result<Vec<Occurrence>, String> {
    let label = decode_entities(label);

    children
        .iter()
        .map(|child| -> Result<Occurrence, String> {
            let fields = child.as_array().map(Vec::as_slice).unwrap_or_default();
            let url = fields
                .first()
                .and_then(Value::as_str)
                .ok_or("child occurrence has no url")?;

            // The scope names the section a target sits in
            let occ = Occurrence::new(url, label.clone());
            Ok(match fields.get(2).and_then(Value::as_str).and_then(non_empty) {
                Some(scope) => occ.with_category(scope),
                None => occ,
            })
        })
        .collect()
}

fn non_empty(s: &str) -> Option<String> {
    let decoded = decode_entities(s);
    if decoded.trim().is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Rewrite a script array literal into JSON: single-quoted strings become
/// double-quoted, `\'` escapes are resolved.
fn script_to_json(body: &str) -> Result<String, String> {
    #[derive(PartialEq)]
    enum State {
        Code,
        Single,
        Double,
    }

    let mut out = String::with_capacity(body.len() + 16);
    let mut state = State::Code;
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '\'' => {
                    out.push('"');
                    state = State::Single;
                }
                '"' => {
                    out.push('"');
                    state = State::Double;
                }
                _ => out.push(c),
            },
            State::Single => match c {
                '\\' => match chars.next() {
                    Some('\'') => out.push('\''),
                    Some(e @ ('\\' | '"' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')) => {
                        out.push('\\');
                        out.push(e);
                    }
                    Some(other) => out.push(other),
                    None => return Err("dangling escape".to_string()),
                },
                '"' => out.push_str("\\\""),
                '\'' => {
                    out.push('"');
                    state = State::Code;
                }
                _ => out.push(c),
            },
            State::Double => {
                out.push(c);
                match c {
                    '\\' => match chars.next() {
                        Some(e) => out.push(e),
                        None => return Err("dangling escape".to_string()),
                    },
                    '"' => state = State::Code,
                    _ => {}
                }
            }
        }
    }

    if state != State::Code {
        return Err("unterminated string literal".to_string());
    }
    Ok(out)
}
