//! Conversion between BSON documents and `google.protobuf.Struct`.

use bson::{Bson, Document};
use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Value};

/// Largest magnitude at which every integer is exactly representable as f64.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Convert a BSON document to a protobuf struct.
pub fn document_to_struct(doc: &Document) -> Struct {
    Struct {
        fields: doc
            .iter()
            .map(|(k, v)| (k.clone(), bson_to_value(v)))
            .collect(),
    }
}

/// Convert a BSON value to a protobuf value.
pub fn bson_to_value(bson: &Bson) -> Value {
    let kind = match bson {
        Bson::Double(v) => Kind::NumberValue(*v),
        Bson::Int32(v) => Kind::NumberValue(f64::from(*v)),
        Bson::Int64(v) => Kind::NumberValue(*v as f64),
        Bson::String(v) => Kind::StringValue(v.clone()),
        Bson::Boolean(v) => Kind::BoolValue(*v),
        Bson::Null | Bson::Undefined => Kind::NullValue(0),
        Bson::Array(arr) => Kind::ListValue(ListValue {
            values: arr.iter().map(bson_to_value).collect(),
        }),
        Bson::Document(doc) => Kind::StructValue(document_to_struct(doc)),
        Bson::ObjectId(oid) => Kind::StringValue(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Kind::StringValue(s),
            Err(_) => Kind::NumberValue(dt.timestamp_millis() as f64),
        },
        other => Kind::StringValue(other.to_string()),
    };
    Value { kind: Some(kind) }
}

/// Convert a protobuf struct to a BSON document.
///
/// Field order follows the struct's map, which is sorted by key.
pub fn struct_to_document(s: &Struct) -> Document {
    s.fields
        .iter()
        .map(|(k, v)| (k.clone(), value_to_bson(v)))
        .collect()
}

/// Convert a protobuf value to BSON.
pub fn value_to_bson(value: &Value) -> Bson {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Bson::Null,
        Some(Kind::NumberValue(n)) => number_to_bson(*n),
        Some(Kind::StringValue(s)) => Bson::String(s.clone()),
        Some(Kind::BoolValue(b)) => Bson::Boolean(*b),
        Some(Kind::StructValue(s)) => Bson::Document(struct_to_document(s)),
        Some(Kind::ListValue(list)) => Bson::Array(list.values.iter().map(value_to_bson).collect()),
    }
}

/// Struct numbers are all doubles; integral ones come back as int64.
fn number_to_bson(n: f64) -> Bson {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Bson::Int64(n as i64)
    } else {
        Bson::Double(n)
    }
}

/// Convert an optional struct, treating absence as an empty document.
pub fn optional_struct_to_document(s: Option<&Struct>) -> Document {
    s.map(struct_to_document).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_to_struct() {
        let doc = doc! {
            "name": "John",
            "age": 30,
            "active": true,
            "tags": ["a", "b"],
        };
        let s = document_to_struct(&doc);
        assert_eq!(s.fields.len(), 4);
        assert_eq!(
            s.fields["name"].kind,
            Some(Kind::StringValue("John".to_string()))
        );
        assert_eq!(s.fields["age"].kind, Some(Kind::NumberValue(30.0)));
        assert!(matches!(s.fields["tags"].kind, Some(Kind::ListValue(_))));
    }

    #[test]
    fn test_struct_to_document_integral_numbers() {
        let doc = doc! { "count": 3, "ratio": 0.5, "big": 1e300 };
        let back = struct_to_document(&document_to_struct(&doc));
        assert_eq!(back.get("count"), Some(&Bson::Int64(3)));
        assert_eq!(back.get("ratio"), Some(&Bson::Double(0.5)));
        assert_eq!(back.get("big"), Some(&Bson::Double(1e300)));
    }

    #[test]
    fn test_nested_document() {
        let doc = doc! { "address": { "city": "Seoul", "zip": null } };
        let back = struct_to_document(&document_to_struct(&doc));
        let address = back.get_document("address").unwrap();
        assert_eq!(address.get_str("city").unwrap(), "Seoul");
        assert_eq!(address.get("zip"), Some(&Bson::Null));
    }

    #[test]
    fn test_object_id_as_hex() {
        let oid = ObjectId::new();
        let value = bson_to_value(&Bson::ObjectId(oid));
        assert_eq!(value.kind, Some(Kind::StringValue(oid.to_hex())));
    }

    #[test]
    fn test_datetime_as_rfc3339() {
        let dt = bson::DateTime::from_millis(1_704_067_200_000);
        let value = bson_to_value(&Bson::DateTime(dt));
        match value.kind {
            Some(Kind::StringValue(s)) => assert!(s.starts_with("2024-01-01T00:00:00")),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_kind_is_null() {
        assert_eq!(value_to_bson(&Value { kind: None }), Bson::Null);
    }

    #[test]
    fn test_optional_struct_absent() {
        assert!(optional_struct_to_document(None).is_empty());
    }
}
