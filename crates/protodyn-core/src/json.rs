//! Canonical JSON projection of generic values.
//!
//! Keys are declared field names in ascending field-number order, integers
//! are JSON numbers, bytes are standard padded base64, enums are symbols when
//! known, non-finite floats are the strings `"NaN"`, `"Infinity"` and
//! `"-Infinity"`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde_json::{Map, Number, Value as Json};

use crate::descriptor::{Cardinality, FieldDescriptor, FieldKind, MessageType};
use crate::error::{ProtodynError, Result};
use crate::value::{MapBuilder, MessageValue, Value};

/// Project a `Value::Message` of type `ty`.
pub fn to_json(value: &Value, ty: MessageType<'_>) -> Result<Json> {
    match value {
        Value::Message(msg) => message_to_json(msg, ty),
        other => Err(projection(format!(
            "{} expects a message value, got {}",
            ty.full_name(),
            other.kind_name()
        ))),
    }
}

/// Inverse of [`to_json`].
pub fn from_json(json: &Json, ty: MessageType<'_>) -> Result<Value> {
    message_from_json(json, ty).map(Value::Message)
}

pub fn message_to_json(msg: &MessageValue, ty: MessageType<'_>) -> Result<Json> {
    let desc = ty.descriptor();
    let mut object = Map::new();

    for (number, value) in msg.iter() {
        if matches!(value, Value::Absent) {
            continue;
        }
        let field = desc.field(number).ok_or_else(|| {
            projection(format!("{} has no field number {number}", desc.full_name))
        })?;

        let json = match (field.cardinality, value) {
            (Cardinality::Singular, _) => scalar_to_json(field, value, ty)?,
            (Cardinality::Repeated, Value::List(items)) => Json::Array(
                items
                    .iter()
                    .map(|item| scalar_to_json(field, item, ty))
                    .collect::<Result<_>>()?,
            ),
            (Cardinality::Map, Value::Map(entries)) => {
                let entry_ty = ty.nested(field)?;
                let value_field = entry_field(entry_ty, 2)?;
                let mut out = Map::new();
                for (key, value) in entries {
                    out.insert(
                        map_key_to_string(field, key, ty)?,
                        scalar_to_json(value_field, value, entry_ty)?,
                    );
                }
                Json::Object(out)
            }
            (_, other) => return Err(mismatch(ty, field, other)),
        };
        object.insert(field.name.clone(), json);
    }

    Ok(Json::Object(object))
}

fn scalar_to_json(field: &FieldDescriptor, value: &Value, ty: MessageType<'_>) -> Result<Json> {
    let json = match (&field.kind, value) {
        (FieldKind::Double, Value::Float(f)) => float_to_json(*f),
        (FieldKind::Float, Value::Float(f)) => {
            let narrow = *f as f32;
            if narrow.is_finite() {
                // shortest decimal form of the 32-bit value
                let shortest: f64 = narrow
                    .to_string()
                    .parse()
                    .map_err(|e| projection(format!("{}: {e}", field.name)))?;
                float_to_json(shortest)
            } else {
                float_to_json(f64::from(narrow))
            }
        }
        (
            FieldKind::Int32
            | FieldKind::Int64
            | FieldKind::Sint32
            | FieldKind::Sint64
            | FieldKind::Sfixed32
            | FieldKind::Sfixed64,
            Value::Int(i),
        ) => Json::from(*i),
        (
            FieldKind::Uint32 | FieldKind::Uint64 | FieldKind::Fixed32 | FieldKind::Fixed64,
            Value::UInt(u),
        ) => Json::from(*u),
        (FieldKind::Bool, Value::Bool(b)) => Json::Bool(*b),
        (FieldKind::String, Value::String(s)) => Json::String(s.clone()),
        (FieldKind::Bytes, Value::Bytes(b)) => Json::String(STANDARD.encode(b)),
        (FieldKind::Enum(name), Value::Enum(n)) => match ty.enumeration(name)?.name_of(*n) {
            Some(symbol) => Json::String(symbol.to_string()),
            None => Json::from(*n),
        },
        (FieldKind::Message(_), Value::Message(m)) => message_to_json(m, ty.nested(field)?)?,
        (_, other) => return Err(mismatch(ty, field, other)),
    };
    Ok(json)
}

fn float_to_json(f: f64) -> Json {
    if f.is_nan() {
        Json::String("NaN".into())
    } else if f.is_infinite() {
        Json::String(if f > 0.0 { "Infinity" } else { "-Infinity" }.into())
    } else {
        Number::from_f64(f).map(Json::Number).unwrap_or(Json::Null)
    }
}

fn map_key_to_string(field: &FieldDescriptor, key: &Value, ty: MessageType<'_>) -> Result<String> {
    match key {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        Value::String(s) => Ok(s.clone()),
        other => Err(projection(format!(
            "{}.{}: {} is not a valid map key",
            ty.full_name(),
            field.name,
            other.kind_name()
        ))),
    }
}

fn message_from_json(json: &Json, ty: MessageType<'_>) -> Result<MessageValue> {
    let desc = ty.descriptor();
    let object = json.as_object().ok_or_else(|| {
        projection(format!("{}: expected a JSON object", desc.full_name))
    })?;

    let mut msg = MessageValue::new();
    for (key, json) in object {
        let field = desc.field_by_name(key).ok_or_else(|| {
            projection(format!("{} has no field named '{key}'", desc.full_name))
        })?;
        if json.is_null() {
            continue;
        }

        let value = match field.cardinality {
            Cardinality::Singular => scalar_from_json(field, json, ty)?,
            Cardinality::Repeated => {
                let items = json.as_array().ok_or_else(|| expected(ty, field, "an array"))?;
                Value::List(
                    items
                        .iter()
                        .map(|item| scalar_from_json(field, item, ty))
                        .collect::<Result<_>>()?,
                )
            }
            Cardinality::Map => {
                let object = json.as_object().ok_or_else(|| expected(ty, field, "an object"))?;
                let entry_ty = ty.nested(field)?;
                let key_field = entry_field(entry_ty, 1)?;
                let value_field = entry_field(entry_ty, 2)?;
                // spellings of one key ("1", "01") collapse, last one wins
                let mut entries = MapBuilder::new();
                for (key, json) in object {
                    let key = map_key_from_string(key_field, key, entry_ty)?;
                    entries.insert(key, scalar_from_json(value_field, json, entry_ty)?);
                }
                Value::Map(entries.into_entries())
            }
        };
        msg.set(field.number, value);
    }
    Ok(msg)
}

fn scalar_from_json(field: &FieldDescriptor, json: &Json, ty: MessageType<'_>) -> Result<Value> {
    let value = match &field.kind {
        FieldKind::Double => Value::Float(float_from_json(field, json, ty)?),
        FieldKind::Float => {
            let f = float_from_json(field, json, ty)?;
            if f.is_finite() && f.abs() > f64::from(f32::MAX) {
                return Err(projection(format!(
                    "{}.{}: {f} out of range for float",
                    ty.full_name(),
                    field.name
                )));
            }
            Value::Float(f64::from(f as f32))
        }
        FieldKind::Int64 | FieldKind::Sint64 | FieldKind::Sfixed64 => {
            Value::Int(signed_from_json(field, json, ty)?)
        }
        FieldKind::Int32 | FieldKind::Sint32 | FieldKind::Sfixed32 => {
            let i = signed_from_json(field, json, ty)?;
            i32::try_from(i).map_err(|_| out_of_range(ty, field, i))?;
            Value::Int(i)
        }
        FieldKind::Uint64 | FieldKind::Fixed64 => Value::UInt(unsigned_from_json(field, json, ty)?),
        FieldKind::Uint32 | FieldKind::Fixed32 => {
            let u = unsigned_from_json(field, json, ty)?;
            u32::try_from(u).map_err(|_| out_of_range(ty, field, u))?;
            Value::UInt(u)
        }
        FieldKind::Bool => Value::Bool(json.as_bool().ok_or_else(|| expected(ty, field, "a bool"))?),
        FieldKind::String => Value::String(
            json.as_str()
                .ok_or_else(|| expected(ty, field, "a string"))?
                .to_string(),
        ),
        FieldKind::Bytes => {
            let text = json.as_str().ok_or_else(|| expected(ty, field, "a base64 string"))?;
            let raw = STANDARD.decode(text).map_err(|e| {
                projection(format!("{}.{}: invalid base64: {e}", ty.full_name(), field.name))
            })?;
            Value::Bytes(Bytes::from(raw))
        }
        FieldKind::Enum(name) => {
            let descriptor = ty.enumeration(name)?;
            let number = match json {
                Json::String(symbol) => descriptor.number_of(symbol).ok_or_else(|| {
                    projection(format!(
                        "{}.{}: unknown {name} symbol '{symbol}'",
                        ty.full_name(),
                        field.name
                    ))
                })?,
                _ => {
                    let i = signed_from_json(field, json, ty)?;
                    i32::try_from(i).map_err(|_| out_of_range(ty, field, i))?
                }
            };
            Value::Enum(number)
        }
        FieldKind::Message(_) => Value::Message(message_from_json(json, ty.nested(field)?)?),
    };
    Ok(value)
}

fn float_from_json(field: &FieldDescriptor, json: &Json, ty: MessageType<'_>) -> Result<f64> {
    match json {
        Json::Number(n) => n.as_f64().ok_or_else(|| expected(ty, field, "a number")),
        Json::String(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            _ => Err(expected(ty, field, "a number")),
        },
        _ => Err(expected(ty, field, "a number")),
    }
}

fn signed_from_json(field: &FieldDescriptor, json: &Json, ty: MessageType<'_>) -> Result<i64> {
    match json {
        Json::Number(n) => n.as_i64().ok_or_else(|| expected(ty, field, "an integer")),
        Json::String(s) => s.parse().map_err(|_| expected(ty, field, "an integer")),
        _ => Err(expected(ty, field, "an integer")),
    }
}

fn unsigned_from_json(field: &FieldDescriptor, json: &Json, ty: MessageType<'_>) -> Result<u64> {
    match json {
        Json::Number(n) => n
            .as_u64()
            .ok_or_else(|| expected(ty, field, "a non-negative integer")),
        Json::String(s) => s
            .parse()
            .map_err(|_| expected(ty, field, "a non-negative integer")),
        _ => Err(expected(ty, field, "a non-negative integer")),
    }
}

fn map_key_from_string(key_field: &FieldDescriptor, key: &str, ty: MessageType<'_>) -> Result<Value> {
    match key_field.kind {
        FieldKind::Bool => match key {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(expected(ty, key_field, "'true' or 'false'")),
        },
        // integer kinds accept decimal strings
        _ => scalar_from_json(key_field, &Json::String(key.to_string()), ty),
    }
}

fn entry_field(entry_ty: MessageType<'_>, number: u32) -> Result<&FieldDescriptor> {
    entry_ty.descriptor().field(number).ok_or_else(|| {
        projection(format!("{} is not a map entry", entry_ty.full_name()))
    })
}

fn projection(msg: String) -> ProtodynError {
    ProtodynError::Projection(msg)
}

fn expected(ty: MessageType<'_>, field: &FieldDescriptor, what: &str) -> ProtodynError {
    projection(format!("{}.{}: expected {what}", ty.full_name(), field.name))
}

fn out_of_range(ty: MessageType<'_>, field: &FieldDescriptor, v: impl std::fmt::Display) -> ProtodynError {
    projection(format!(
        "{}.{}: {v} out of range for {}",
        ty.full_name(),
        field.name,
        field.kind.name()
    ))
}

fn mismatch(ty: MessageType<'_>, field: &FieldDescriptor, got: &Value) -> ProtodynError {
    projection(format!(
        "{}.{}: {} field holds a {} value",
        ty.full_name(),
        field.name,
        field.kind.name(),
        got.kind_name()
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::codec::{decode, encode_message};
    use crate::schema::catalog::{StaticCatalog, COMPLEX_MESSAGE, IMPORT_MESSAGE, SIMPLE_MESSAGE};

    #[test]
    fn simple_message_projection() {
        let catalog = StaticCatalog::new();
        let ty = catalog.resolve(SIMPLE_MESSAGE).unwrap();
        let msg = MessageValue::new()
            .with(1, Value::String("first parameter".into()))
            .with(2, Value::Bool(true))
            .with(3, Value::Bytes(Bytes::from_static(&[0, 1, 2])))
            .with(5, Value::Int(-32321323412))
            .with(14, Value::Float(f64::from(-0.2f32)))
            .with(15, Value::Float(f64::NAN));
        let json = message_to_json(&msg, ty).unwrap();
        assert_eq!(
            json,
            json!({
                "param_01": "first parameter",
                "param_02": true,
                "param_03": "AAEC",
                "param_05": -32321323412i64,
                "param_14": -0.2,
                "param_15": "NaN",
            })
        );
        assert_eq!(from_json(&json, ty).unwrap(), Value::Message(msg));
    }

    #[test]
    fn keys_follow_field_numbers() {
        let catalog = StaticCatalog::new();
        let ty = catalog.resolve(SIMPLE_MESSAGE).unwrap();
        let msg = MessageValue::new()
            .with(15, Value::Float(1.5))
            .with(2, Value::Bool(true));
        let text = serde_json::to_string(&message_to_json(&msg, ty).unwrap()).unwrap();
        assert_eq!(text, r#"{"param_02":true,"param_15":1.5}"#);
    }

    #[test]
    fn enum_symbols_and_unknown_numbers() {
        let catalog = StaticCatalog::new();
        let ty = catalog.resolve(IMPORT_MESSAGE).unwrap();
        let known = json!({"param_02": {"param_01": "VALUE_2"}});
        let value = from_json(&known, ty).unwrap();
        assert_eq!(to_json(&value, ty).unwrap(), known);

        let unknown = json!({"param_02": {"param_01": 9}});
        let value = from_json(&unknown, ty).unwrap();
        assert_eq!(to_json(&value, ty).unwrap(), unknown);

        let bad = json!({"param_02": {"param_01": "VALUE_9"}});
        assert_eq!(from_json(&bad, ty).unwrap_err().code().as_str(), "PROJECTION");
    }

    #[test]
    fn complex_message_survives_wire_and_json() {
        let catalog = StaticCatalog::new();
        let ty = catalog.resolve(COMPLEX_MESSAGE).unwrap();
        let json = json!({
            "param_01": ["one", "two", "three"],
            "param_02": {"autumn": "red", "winter": "blue"},
            "param_03_string": "this is a oneof<string>",
        });
        let value = from_json(&json, ty).unwrap();
        let bytes = encode_message(value.as_message().unwrap(), ty).unwrap();
        let decoded = decode(&bytes, ty).unwrap();
        assert_eq!(to_json(&decoded, ty).unwrap(), json);
    }

    #[test]
    fn equal_map_keys_collapse_to_the_last_entry() {
        use crate::descriptor::{FieldDescriptor, MessageDescriptor};
        use crate::schema::pool::TypePool;

        let mut pool = TypePool::new();
        pool.add_message(MessageDescriptor::new(
            "t.M",
            vec![FieldDescriptor::map(1, "m", "t.M.MEntry")],
        ));
        pool.add_message(MessageDescriptor::map_entry(
            "t.M.MEntry",
            FieldKind::Int32,
            FieldKind::String,
        ));
        let ty = MessageType::lookup(&pool, "t.M").unwrap();

        let value = from_json(&json!({"m": {"1": "a", "2": "c", "01": "b"}}), ty).unwrap();
        let msg = value.as_message().unwrap();
        assert_eq!(
            msg.get(1),
            Some(&Value::Map(vec![
                (Value::Int(1), Value::String("b".into())),
                (Value::Int(2), Value::String("c".into())),
            ]))
        );
        assert!(encode_message(msg, ty).is_ok());
    }

    #[test]
    fn integer_strings_and_nulls() {
        let catalog = StaticCatalog::new();
        let ty = catalog.resolve(SIMPLE_MESSAGE).unwrap();
        let value = from_json(&json!({"param_07": "2000000", "param_01": null}), ty).unwrap();
        let msg = value.as_message().unwrap();
        assert_eq!(msg.get(7), Some(&Value::UInt(2_000_000)));
        assert!(!msg.contains(1));
    }

    #[test]
    fn rejects_bad_input() {
        let catalog = StaticCatalog::new();
        let ty = catalog.resolve(SIMPLE_MESSAGE).unwrap();
        for bad in [
            json!([1, 2]),
            json!({"nope": 1}),
            json!({"param_04": 1.5}),
            json!({"param_04": 3_000_000_000u64}),
            json!({"param_06": -1}),
            json!({"param_03": "***"}),
            json!({"param_14": 1e300}),
        ] {
            let err = from_json(&bad, ty).unwrap_err();
            assert_eq!(err.code().as_str(), "PROJECTION", "{bad}");
        }
    }
}
