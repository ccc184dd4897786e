//! Tagged value decoding for `get_tag` results.
//!
//! A tagged value is a `{type, value}` pair. The tag names one of the wire
//! protocol's scalar types and selects the converter for the raw value.
//! The set of tags is closed: a tag that is not listed in [`ValueTag`] is a
//! decode defect.

use crate::error::{CollectionError, Result};
use bson::{oid::ObjectId, Bson, Document};
use std::fmt;
use std::str::FromStr;

/// Field holding the tag inside a tagged value.
pub const TYPE_FIELD: &str = "type";

/// Field holding the raw value inside a tagged value.
pub const VALUE_FIELD: &str = "value";

/// Value types recognized by the converter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Int,
    Float,
    Str,
    Bool,
    DateTime,
    ObjectId,
    None,
}

impl ValueTag {
    /// Every registered tag.
    pub const ALL: [ValueTag; 7] = [
        ValueTag::Int,
        ValueTag::Float,
        ValueTag::Str,
        ValueTag::Bool,
        ValueTag::DateTime,
        ValueTag::ObjectId,
        ValueTag::None,
    ];

    /// The tag as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueTag::Int => "int",
            ValueTag::Float => "float",
            ValueTag::Str => "str",
            ValueTag::Bool => "bool",
            ValueTag::DateTime => "datetime",
            ValueTag::ObjectId => "objectid",
            ValueTag::None => "none",
        }
    }

    /// Decode a raw value into its native BSON form.
    pub fn decode(self, raw: &Bson) -> Result<Bson> {
        match self {
            ValueTag::Int => decode_int(raw),
            ValueTag::Float => decode_float(raw),
            ValueTag::Str => decode_str(raw),
            ValueTag::Bool => decode_bool(raw),
            ValueTag::DateTime => decode_datetime(raw),
            ValueTag::ObjectId => decode_object_id(raw),
            ValueTag::None => Ok(Bson::Null),
        }
    }
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueTag {
    type Err = CollectionError;

    fn from_str(s: &str) -> Result<Self> {
        ValueTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| CollectionError::UnknownTag(s.to_string()))
    }
}

/// Decode a single `{type, value}` entry.
pub fn decode_tagged(entry: &Bson) -> Result<Bson> {
    let entry = entry.as_document().ok_or_else(|| {
        CollectionError::decode(format!("tagged value is not a document: {entry}"))
    })?;
    let tag: ValueTag = entry
        .get_str(TYPE_FIELD)
        .map_err(|_| CollectionError::decode(format!("tagged value has no `{TYPE_FIELD}`")))?
        .parse()?;
    tag.decode(entry.get(VALUE_FIELD).unwrap_or(&Bson::Null))
}

/// Replace every field's list of tagged values with the decoded list.
pub fn decode_tag_document(doc: &Document) -> Result<Document> {
    let mut decoded = Document::new();
    for (field, values) in doc {
        let values = values.as_array().ok_or_else(|| {
            CollectionError::decode(format!("field `{field}` is not a list of tagged values"))
        })?;
        let native = values.iter().map(decode_tagged).collect::<Result<Vec<_>>>()?;
        decoded.insert(field.clone(), Bson::Array(native));
    }
    Ok(decoded)
}

fn mismatch(tag: ValueTag, raw: &Bson) -> CollectionError {
    CollectionError::decode(format!("cannot decode {raw} as {tag}"))
}

/// Doubles in this range convert to i64 without saturating.
const I64_RANGE: std::ops::Range<f64> = -9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0;

fn decode_int(raw: &Bson) -> Result<Bson> {
    match raw {
        Bson::Int32(v) => Ok(Bson::Int64(i64::from(*v))),
        Bson::Int64(v) => Ok(Bson::Int64(*v)),
        Bson::Double(v) if v.fract() == 0.0 && I64_RANGE.contains(v) => {
            Ok(Bson::Int64(*v as i64))
        }
        Bson::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Bson::Int64)
            .map_err(|_| mismatch(ValueTag::Int, raw)),
        _ => Err(mismatch(ValueTag::Int, raw)),
    }
}

fn decode_float(raw: &Bson) -> Result<Bson> {
    match raw {
        Bson::Double(v) => Ok(Bson::Double(*v)),
        Bson::Int32(v) => Ok(Bson::Double(f64::from(*v))),
        Bson::Int64(v) => Ok(Bson::Double(*v as f64)),
        Bson::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Bson::Double)
            .map_err(|_| mismatch(ValueTag::Float, raw)),
        _ => Err(mismatch(ValueTag::Float, raw)),
    }
}

fn decode_str(raw: &Bson) -> Result<Bson> {
    match raw {
        Bson::String(s) => Ok(Bson::String(s.clone())),
        Bson::Int32(v) => Ok(Bson::String(v.to_string())),
        Bson::Int64(v) => Ok(Bson::String(v.to_string())),
        Bson::Double(v) => Ok(Bson::String(v.to_string())),
        Bson::Boolean(v) => Ok(Bson::String(v.to_string())),
        _ => Err(mismatch(ValueTag::Str, raw)),
    }
}

fn decode_bool(raw: &Bson) -> Result<Bson> {
    match raw {
        Bson::Boolean(v) => Ok(Bson::Boolean(*v)),
        Bson::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Bson::Boolean(true)),
            "false" | "0" => Ok(Bson::Boolean(false)),
            _ => Err(mismatch(ValueTag::Bool, raw)),
        },
        Bson::Int32(v) => Ok(Bson::Boolean(*v != 0)),
        Bson::Int64(v) => Ok(Bson::Boolean(*v != 0)),
        _ => Err(mismatch(ValueTag::Bool, raw)),
    }
}

fn decode_datetime(raw: &Bson) -> Result<Bson> {
    match raw {
        Bson::DateTime(dt) => Ok(Bson::DateTime(*dt)),
        Bson::String(s) => bson::DateTime::parse_rfc3339_str(s.trim())
            .map(Bson::DateTime)
            .map_err(|_| mismatch(ValueTag::DateTime, raw)),
        Bson::Int64(millis) => Ok(Bson::DateTime(bson::DateTime::from_millis(*millis))),
        _ => Err(mismatch(ValueTag::DateTime, raw)),
    }
}

fn decode_object_id(raw: &Bson) -> Result<Bson> {
    match raw {
        Bson::ObjectId(oid) => Ok(Bson::ObjectId(*oid)),
        Bson::String(s) => ObjectId::parse_str(s.trim())
            .map(Bson::ObjectId)
            .map_err(|_| mismatch(ValueTag::ObjectId, raw)),
        _ => Err(mismatch(ValueTag::ObjectId, raw)),
    }
}
