//! Wire bytes -> generic value.
//!
//! Unknown field numbers (and known numbers arriving with an incompatible
//! wire type) are skipped and dropped so that newer writers stay readable.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::descriptor::{Cardinality, FieldDescriptor, FieldKind, MessageType};
use crate::error::{ProtodynError, Result};
use crate::protocol::wire::{self, WireType, RECURSION_LIMIT};
use crate::value::{default_value, MapBuilder, MessageValue, Value};

/// Decode `bytes` as a message of type `ty`. Always yields `Value::Message`.
pub fn decode(bytes: &[u8], ty: MessageType<'_>) -> Result<Value> {
    decode_message(bytes, ty, 0).map(Value::Message)
}

fn decode_message(mut buf: &[u8], ty: MessageType<'_>, depth: usize) -> Result<MessageValue> {
    if depth > RECURSION_LIMIT {
        return Err(ProtodynError::MalformedWireData(format!(
            "message nesting exceeds {RECURSION_LIMIT} levels"
        )));
    }

    let desc = ty.descriptor();
    let mut msg = MessageValue::new();
    let mut maps: BTreeMap<u32, MapBuilder> = BTreeMap::new();

    while !buf.is_empty() {
        let (number, wire_type) = wire::read_tag(&mut buf)?;
        let Some(field) = desc.field(number) else {
            wire::skip_field(&mut buf, number, wire_type)?;
            continue;
        };

        match field.cardinality {
            Cardinality::Singular if wire_type == field.kind.wire_type() => {
                let value = read_value(&mut buf, field, ty, depth)?;
                set_singular(&mut msg, field, value, ty)?;
            }
            Cardinality::Repeated
                if wire_type == WireType::LengthDelimited && field.kind.is_packable() =>
            {
                // packed block; values join the same sequence as unpacked ones
                let mut block = wire::read_length_delimited(&mut buf)?;
                while !block.is_empty() {
                    let value = read_value(&mut block, field, ty, depth)?;
                    msg.push(number, value);
                }
            }
            Cardinality::Repeated if wire_type == field.kind.wire_type() => {
                let value = read_value(&mut buf, field, ty, depth)?;
                msg.push(number, value);
            }
            Cardinality::Map if wire_type == WireType::LengthDelimited => {
                let entry = wire::read_length_delimited(&mut buf)?;
                let (key, value) = read_map_entry(entry, field, ty, depth)?;
                maps.entry(number).or_default().insert(key, value);
            }
            _ => wire::skip_field(&mut buf, number, wire_type)?,
        }
    }

    for (number, map) in maps {
        msg.set(number, Value::Map(map.into_entries()));
    }
    Ok(msg)
}

fn read_value(
    buf: &mut &[u8],
    field: &FieldDescriptor,
    ty: MessageType<'_>,
    depth: usize,
) -> Result<Value> {
    let value = match &field.kind {
        FieldKind::Double => Value::Float(f64::from_bits(wire::read_fixed64(buf)?)),
        FieldKind::Float => Value::Float(f64::from(f32::from_bits(wire::read_fixed32(buf)?))),
        // 32-bit kinds keep the low 32 bits of the varint
        FieldKind::Int32 => Value::Int(i64::from(wire::read_varint(buf)? as i32)),
        FieldKind::Int64 => Value::Int(wire::read_varint(buf)? as i64),
        FieldKind::Uint32 => Value::UInt(u64::from(wire::read_varint(buf)? as u32)),
        FieldKind::Uint64 => Value::UInt(wire::read_varint(buf)?),
        FieldKind::Sint32 => {
            Value::Int(i64::from(wire::zigzag_decode32(wire::read_varint(buf)? as u32)))
        }
        FieldKind::Sint64 => Value::Int(wire::zigzag_decode64(wire::read_varint(buf)?)),
        FieldKind::Fixed32 => Value::UInt(u64::from(wire::read_fixed32(buf)?)),
        FieldKind::Fixed64 => Value::UInt(wire::read_fixed64(buf)?),
        FieldKind::Sfixed32 => Value::Int(i64::from(wire::read_fixed32(buf)? as i32)),
        FieldKind::Sfixed64 => Value::Int(wire::read_fixed64(buf)? as i64),
        FieldKind::Bool => Value::Bool(wire::read_varint(buf)? != 0),
        FieldKind::Enum(_) => Value::Enum(wire::read_varint(buf)? as i32),
        FieldKind::String => {
            let raw = wire::read_length_delimited(buf)?;
            let s = std::str::from_utf8(raw).map_err(|e| {
                ProtodynError::MalformedWireData(format!(
                    "{}.{}: invalid UTF-8 in string field: {e}",
                    ty.full_name(),
                    field.name
                ))
            })?;
            Value::String(s.to_string())
        }
        FieldKind::Bytes => Value::Bytes(Bytes::copy_from_slice(wire::read_length_delimited(buf)?)),
        FieldKind::Message(_) => {
            let raw = wire::read_length_delimited(buf)?;
            let nested = ty.nested(field)?;
            Value::Message(decode_message(raw, nested, depth + 1)?)
        }
    };
    Ok(value)
}

/// Store a singular value: the last occurrence wins, sub-messages merge,
/// and setting a oneof member clears its siblings.
fn set_singular(
    msg: &mut MessageValue,
    field: &FieldDescriptor,
    value: Value,
    ty: MessageType<'_>,
) -> Result<()> {
    if let Some(group) = field.oneof {
        for member in ty.descriptor().oneof_members(group) {
            if member.number != field.number {
                msg.remove(member.number);
            }
        }
    }

    let value = match value {
        Value::Message(incoming) => match msg.get_mut(field.number) {
            Some(Value::Message(existing)) => {
                merge_message(existing, incoming, ty.nested(field)?)?;
                return Ok(());
            }
            _ => Value::Message(incoming),
        },
        other => other,
    };
    msg.set(field.number, value);
    Ok(())
}

fn merge_message(into: &mut MessageValue, from: MessageValue, ty: MessageType<'_>) -> Result<()> {
    let desc = ty.descriptor();
    for (number, value) in from {
        let Some(field) = desc.field(number) else {
            continue;
        };
        match (field.cardinality, value) {
            (Cardinality::Repeated, Value::List(items)) => {
                for item in items {
                    into.push(number, item);
                }
            }
            (Cardinality::Map, Value::Map(entries)) => {
                let existing = match into.remove(number) {
                    Some(Value::Map(existing)) => existing,
                    _ => Vec::new(),
                };
                let mut map = MapBuilder::from_entries(existing);
                for (k, v) in entries {
                    map.insert(k, v);
                }
                into.set(number, Value::Map(map.into_entries()));
            }
            (_, value) => set_singular(into, field, value, ty)?,
        }
    }
    Ok(())
}

fn read_map_entry(
    entry: &[u8],
    field: &FieldDescriptor,
    ty: MessageType<'_>,
    depth: usize,
) -> Result<(Value, Value)> {
    let entry_ty = ty.nested(field)?;
    let mut decoded = decode_message(entry, entry_ty, depth + 1)?;
    let key = take_or_default(&mut decoded, entry_ty, 1)?;
    let value = take_or_default(&mut decoded, entry_ty, 2)?;
    Ok((key, value))
}

fn take_or_default(entry: &mut MessageValue, ty: MessageType<'_>, number: u32) -> Result<Value> {
    if let Some(v) = entry.remove(number) {
        return Ok(v);
    }
    ty.descriptor()
        .field(number)
        .map(|f| default_value(&f.kind))
        .ok_or_else(|| {
            ProtodynError::SchemaLoad(format!("map entry {} lacks field {number}", ty.full_name()))
        })
}
