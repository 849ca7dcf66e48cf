//! Structured value codec
//!
//! Bidirectional mapping between [`DynamicValue`] trees and the typed,
//! tag-discriminated attribute format used by key-value table stores:
//!
//! | Value     | Wire                     |
//! |-----------|--------------------------|
//! | `Null`    | `{"NULL": true}`         |
//! | `String`  | `{"S": "..."}`           |
//! | `Number`  | `{"N": "<decimal>"}`     |
//! | `Boolean` | `{"BOOL": true}`         |
//! | `List`    | `{"L": [ <wire>... ]}`   |
//! | `Map`     | `{"M": { k: <wire> }}`   |
//!
//! # Numeric precision
//!
//! Numbers are written with the shortest decimal representation that parses
//! back to the same `f64`, so every finite double round-trips exactly.
//! Decimal strings produced by other writers are parsed to the nearest
//! `f64`; digits beyond double precision (about 15-17 significant digits)
//! are lost on decode. `NaN` and infinities have no decimal form and are
//! rejected on encode.
//!
//! # Depth
//!
//! Encoding and decoding recurse once per nesting level with no depth limit.
//! Callers accepting untrusted input must bound its depth themselves.
//! Owned [`DynamicValue`] trees cannot contain cycles.

use crate::value::{DynamicMap, DynamicValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wire-encoded item: attribute name to typed attribute
pub type WireItem = BTreeMap<String, AttributeWire>;

/// Typed attribute in wire form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeWire {
    /// String attribute
    #[serde(rename = "S")]
    S(String),
    /// Number attribute carried as a decimal string
    #[serde(rename = "N")]
    N(String),
    /// Boolean attribute
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null marker; only `true` is well-formed
    #[serde(rename = "NULL")]
    Null(bool),
    /// Ordered list of attributes
    #[serde(rename = "L")]
    L(Vec<AttributeWire>),
    /// Map of attributes
    #[serde(rename = "M")]
    M(BTreeMap<String, AttributeWire>),
}

/// Codec failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The value has no wire representation
    #[error("Unsupported type at {path}: {type_name}")]
    UnsupportedType {
        /// Location inside the value tree (`$` is the root)
        path: String,
        /// Description of the offending type
        type_name: String,
    },

    /// The wire value is missing its tag, carries an unknown tag, or has a
    /// payload that does not match its tag
    #[error("Malformed wire value at {path}: {reason}")]
    MalformedWire {
        /// Location inside the wire tree (`$` is the root)
        path: String,
        /// What was wrong
        reason: String,
    },
}

impl CodecError {
    fn unsupported(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            path: "$".to_string(),
            type_name: type_name.into(),
        }
    }

    fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedWire {
            path: "$".to_string(),
            reason: reason.into(),
        }
    }

    /// Prefix the error location with an enclosing path segment
    fn within(mut self, segment: &PathSegment<'_>) -> Self {
        let path = match &mut self {
            CodecError::UnsupportedType { path, .. } | CodecError::MalformedWire { path, .. } => {
                path
            }
        };
        let rest = path.trim_start_matches('$');
        *path = match segment {
            PathSegment::Index(index) => format!("$[{index}]{rest}"),
            PathSegment::Key(key) => format!("$.{key}{rest}"),
        };
        self
    }
}

enum PathSegment<'a> {
    Index(usize),
    Key(&'a str),
}

/// Encode a dynamic value into its wire form
pub fn encode(value: &DynamicValue) -> Result<AttributeWire, CodecError> {
    match value {
        DynamicValue::Null => Ok(AttributeWire::Null(true)),
        DynamicValue::String(s) => Ok(AttributeWire::S(s.clone())),
        DynamicValue::Number(n) => encode_number(*n),
        DynamicValue::Boolean(b) => Ok(AttributeWire::Bool(*b)),
        DynamicValue::List(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| encode(item).map_err(|e| e.within(&PathSegment::Index(index))))
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeWire::L),
        DynamicValue::Map(map) => encode_item(map).map(AttributeWire::M),
    }
}

/// Decode a wire attribute back into a dynamic value
pub fn decode(wire: &AttributeWire) -> Result<DynamicValue, CodecError> {
    match wire {
        AttributeWire::Null(true) => Ok(DynamicValue::Null),
        AttributeWire::Null(false) => Err(CodecError::malformed("NULL marker must be true")),
        AttributeWire::S(s) => Ok(DynamicValue::String(s.clone())),
        AttributeWire::N(digits) => decode_number(digits),
        AttributeWire::Bool(b) => Ok(DynamicValue::Boolean(*b)),
        AttributeWire::L(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| decode(item).map_err(|e| e.within(&PathSegment::Index(index))))
            .collect::<Result<Vec<_>, _>>()
            .map(DynamicValue::List),
        AttributeWire::M(map) => decode_item(map).map(DynamicValue::Map),
    }
}

/// Encode every attribute of an item, preserving all keys
pub fn encode_item(item: &DynamicMap) -> Result<WireItem, CodecError> {
    item.iter()
        .map(|(key, value)| {
            encode(value)
                .map(|wire| (key.clone(), wire))
                .map_err(|e| e.within(&PathSegment::Key(key)))
        })
        .collect()
}

/// Decode every attribute of a wire item
pub fn decode_item(item: &WireItem) -> Result<DynamicMap, CodecError> {
    item.iter()
        .map(|(key, wire)| {
            decode(wire)
                .map(|value| (key.clone(), value))
                .map_err(|e| e.within(&PathSegment::Key(key)))
        })
        .collect()
}

/// Convert any serializable Rust value into a dynamic value
///
/// Fails with [`CodecError::UnsupportedType`] when the value has no JSON-like
/// shape (for example a map with non-string keys).
pub fn to_dynamic<T: Serialize + ?Sized>(value: &T) -> Result<DynamicValue, CodecError> {
    serde_json::to_value(value)
        .map(DynamicValue::from)
        .map_err(|e| CodecError::unsupported(format!("{}: {e}", std::any::type_name::<T>())))
}

impl AttributeWire {
    /// Parse a wire attribute from untyped JSON, reporting tag problems as
    /// [`CodecError::MalformedWire`]
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CodecError> {
        let object = value
            .as_object()
            .ok_or_else(|| CodecError::malformed("expected an object with a single type tag"))?;

        let mut entries = object.iter();
        let (tag, payload) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => return Err(CodecError::malformed("missing type tag")),
            (Some(_), Some(_)) => {
                return Err(CodecError::malformed(format!(
                    "expected exactly one type tag, found {}",
                    object.len()
                )))
            }
        };

        let mismatch = || CodecError::malformed(format!("payload does not match tag {tag}"));

        match tag.as_str() {
            "S" => payload
                .as_str()
                .map(|s| AttributeWire::S(s.to_string()))
                .ok_or_else(mismatch),
            "N" => payload
                .as_str()
                .map(|s| AttributeWire::N(s.to_string()))
                .ok_or_else(mismatch),
            "BOOL" => payload.as_bool().map(AttributeWire::Bool).ok_or_else(mismatch),
            "NULL" => payload.as_bool().map(AttributeWire::Null).ok_or_else(mismatch),
            "L" => payload
                .as_array()
                .ok_or_else(mismatch)?
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    AttributeWire::from_json(item).map_err(|e| e.within(&PathSegment::Index(index)))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(AttributeWire::L),
            "M" => payload
                .as_object()
                .ok_or_else(mismatch)?
                .iter()
                .map(|(key, item)| {
                    AttributeWire::from_json(item)
                        .map(|wire| (key.clone(), wire))
                        .map_err(|e| e.within(&PathSegment::Key(key)))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(AttributeWire::M),
            other => Err(CodecError::malformed(format!("unknown type tag {other}"))),
        }
    }

    /// Render the wire attribute as JSON
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeWire::S(s) => serde_json::json!({ "S": s }),
            AttributeWire::N(n) => serde_json::json!({ "N": n }),
            AttributeWire::Bool(b) => serde_json::json!({ "BOOL": b }),
            AttributeWire::Null(b) => serde_json::json!({ "NULL": b }),
            AttributeWire::L(items) => {
                serde_json::json!({ "L": items.iter().map(AttributeWire::to_json).collect::<Vec<_>>() })
            }
            AttributeWire::M(map) => serde_json::json!({
                "M": map
                    .iter()
                    .map(|(key, wire)| (key.clone(), wire.to_json()))
                    .collect::<serde_json::Map<_, _>>()
            }),
        }
    }
}

fn encode_number(n: f64) -> Result<AttributeWire, CodecError> {
    if !n.is_finite() {
        return Err(CodecError::unsupported(format!("non-finite number {n}")));
    }
    // `Display` for f64 emits the shortest digits that parse back to `n`
    Ok(AttributeWire::N(format!("{n}")))
}

fn decode_number(digits: &str) -> Result<DynamicValue, CodecError> {
    let parsed: f64 = digits
        .trim()
        .parse()
        .map_err(|_| CodecError::malformed(format!("invalid number {digits:?}")))?;
    if !parsed.is_finite() {
        return Err(CodecError::malformed(format!("number out of range {digits:?}")));
    }
    Ok(DynamicValue::Number(parsed))
}
