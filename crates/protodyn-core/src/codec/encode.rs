//! Generic value -> wire bytes.
//!
//! Output is canonical: fields in ascending tag order, absent and
//! default-valued singular scalars omitted (unless the field tracks
//! presence), packed repeated scalars written as one block, map entries in
//! stored order.

use std::collections::HashSet;

use bytes::{BufMut, Bytes, BytesMut};

use crate::descriptor::{Cardinality, FieldDescriptor, FieldKind, MessageType};
use crate::error::{ProtodynError, Result};
use crate::protocol::wire::{self, WireType};
use crate::schema::catalog::{StaticCatalog, StaticMessage};
use crate::value::{MapKey, MessageValue, Value};

/// Encode a `Value::Message` of type `ty`.
pub fn encode(value: &Value, ty: MessageType<'_>) -> Result<Bytes> {
    match value {
        Value::Message(msg) => encode_message(msg, ty),
        other => Err(ProtodynError::Encode(format!(
            "{} expects a message value, got {}",
            ty.full_name(),
            other.kind_name()
        ))),
    }
}

pub fn encode_message(msg: &MessageValue, ty: MessageType<'_>) -> Result<Bytes> {
    let mut buf = BytesMut::new();
    write_message(&mut buf, msg, ty)?;
    Ok(buf.freeze())
}

/// Encode a compiled-in shape with the catalog's descriptor for it.
pub fn encode_static<M: StaticMessage>(message: &M, catalog: &StaticCatalog) -> Result<Bytes> {
    let ty = catalog.resolve(M::NAME)?;
    encode_message(&message.to_value(), ty)
}

fn write_message(buf: &mut BytesMut, msg: &MessageValue, ty: MessageType<'_>) -> Result<()> {
    let desc = ty.descriptor();

    if let Some(unknown) = msg.numbers().find(|n| desc.field(*n).is_none()) {
        return Err(ProtodynError::Encode(format!(
            "{} has no field number {unknown}",
            desc.full_name
        )));
    }

    for (index, name) in desc.oneofs.iter().enumerate() {
        let present = desc
            .oneof_members(index)
            .filter(|f| msg.contains(f.number))
            .count();
        if present > 1 {
            return Err(ProtodynError::Encode(format!(
                "{}: oneof '{name}' has {present} members set",
                desc.full_name
            )));
        }
    }

    for field in &desc.fields {
        let Some(value) = msg.get(field.number) else {
            continue;
        };
        if matches!(value, Value::Absent) {
            continue;
        }

        match field.cardinality {
            Cardinality::Singular => {
                if !field.presence
                    && !matches!(field.kind, FieldKind::Message(_))
                    && value.is_default()
                {
                    // still reject a default of the wrong kind
                    write_value(&mut BytesMut::new(), field, value, ty)?;
                    continue;
                }
                wire::write_tag(buf, field.number, field.kind.wire_type());
                write_value(buf, field, value, ty)?;
            }
            Cardinality::Repeated => {
                let Value::List(items) = value else {
                    return Err(mismatch(ty, field, "list", value));
                };
                if items.is_empty() {
                    continue;
                }
                if field.packed && field.kind.is_packable() {
                    let mut block = BytesMut::new();
                    for item in items {
                        write_value(&mut block, field, item, ty)?;
                    }
                    wire::write_tag(buf, field.number, WireType::LengthDelimited);
                    wire::write_length_delimited(buf, &block);
                } else {
                    for item in items {
                        wire::write_tag(buf, field.number, field.kind.wire_type());
                        write_value(buf, field, item, ty)?;
                    }
                }
            }
            Cardinality::Map => {
                let Value::Map(entries) = value else {
                    return Err(mismatch(ty, field, "map", value));
                };
                write_map(buf, field, entries, ty)?;
            }
        }
    }

    Ok(())
}

fn write_map(
    buf: &mut BytesMut,
    field: &FieldDescriptor,
    entries: &[(Value, Value)],
    ty: MessageType<'_>,
) -> Result<()> {
    let entry_ty = ty.nested(field)?;
    let entry_desc = entry_ty.descriptor();
    let (Some(key_field), Some(value_field)) = (entry_desc.field(1), entry_desc.field(2)) else {
        return Err(ProtodynError::Encode(format!(
            "{} is not a map entry",
            entry_desc.full_name
        )));
    };

    let mut seen = HashSet::with_capacity(entries.len());
    for (key, value) in entries {
        // non-key kinds are rejected by write_value below
        if MapKey::of(key).is_some_and(|k| !seen.insert(k)) {
            return Err(ProtodynError::Encode(format!(
                "{}.{}: duplicate map key {key:?}",
                ty.full_name(),
                field.name
            )));
        }
        let mut entry = BytesMut::new();
        wire::write_tag(&mut entry, 1, key_field.kind.wire_type());
        write_value(&mut entry, key_field, key, entry_ty)?;
        wire::write_tag(&mut entry, 2, value_field.kind.wire_type());
        write_value(&mut entry, value_field, value, entry_ty)?;

        wire::write_tag(buf, field.number, WireType::LengthDelimited);
        wire::write_length_delimited(buf, &entry);
    }
    Ok(())
}

/// Write one value without its key.
fn write_value(
    buf: &mut BytesMut,
    field: &FieldDescriptor,
    value: &Value,
    ty: MessageType<'_>,
) -> Result<()> {
    match (&field.kind, value) {
        (FieldKind::Double, Value::Float(f)) => buf.put_f64_le(*f),
        (FieldKind::Float, Value::Float(f)) => {
            if f.is_finite() && f.abs() > f64::from(f32::MAX) {
                return Err(out_of_range(ty, field, &f.to_string()));
            }
            buf.put_f32_le(*f as f32)
        }
        (FieldKind::Int32, Value::Int(i)) => {
            // negative int32 is sign-extended to ten bytes
            wire::write_varint(buf, i64::from(to_i32(ty, field, *i)?) as u64)
        }
        (FieldKind::Int64, Value::Int(i)) => wire::write_varint(buf, *i as u64),
        (FieldKind::Uint32, Value::UInt(u)) => {
            wire::write_varint(buf, u64::from(to_u32(ty, field, *u)?))
        }
        (FieldKind::Uint64, Value::UInt(u)) => wire::write_varint(buf, *u),
        (FieldKind::Sint32, Value::Int(i)) => {
            wire::write_varint(buf, u64::from(wire::zigzag_encode32(to_i32(ty, field, *i)?)))
        }
        (FieldKind::Sint64, Value::Int(i)) => wire::write_varint(buf, wire::zigzag_encode64(*i)),
        (FieldKind::Fixed32, Value::UInt(u)) => buf.put_u32_le(to_u32(ty, field, *u)?),
        (FieldKind::Fixed64, Value::UInt(u)) => buf.put_u64_le(*u),
        (FieldKind::Sfixed32, Value::Int(i)) => buf.put_i32_le(to_i32(ty, field, *i)?),
        (FieldKind::Sfixed64, Value::Int(i)) => buf.put_i64_le(*i),
        (FieldKind::Bool, Value::Bool(b)) => wire::write_varint(buf, u64::from(*b)),
        (FieldKind::Enum(_), Value::Enum(n)) => wire::write_varint(buf, i64::from(*n) as u64),
        (FieldKind::String, Value::String(s)) => wire::write_length_delimited(buf, s.as_bytes()),
        (FieldKind::Bytes, Value::Bytes(b)) => wire::write_length_delimited(buf, b),
        (FieldKind::Message(_), Value::Message(m)) => {
            let nested = ty.nested(field)?;
            let mut inner = BytesMut::new();
            write_message(&mut inner, m, nested)?;
            wire::write_length_delimited(buf, &inner);
        }
        (kind, value) => return Err(mismatch(ty, field, kind.name(), value)),
    }
    Ok(())
}

fn to_i32(ty: MessageType<'_>, field: &FieldDescriptor, v: i64) -> Result<i32> {
    i32::try_from(v).map_err(|_| out_of_range(ty, field, &v.to_string()))
}

fn to_u32(ty: MessageType<'_>, field: &FieldDescriptor, v: u64) -> Result<u32> {
    u32::try_from(v).map_err(|_| out_of_range(ty, field, &v.to_string()))
}

fn out_of_range(ty: MessageType<'_>, field: &FieldDescriptor, v: &str) -> ProtodynError {
    ProtodynError::Encode(format!(
        "{}.{}: value {v} out of range for {}",
        ty.full_name(),
        field.name,
        field.kind.name()
    ))
}

fn mismatch(
    ty: MessageType<'_>,
    field: &FieldDescriptor,
    expected: &str,
    got: &Value,
) -> ProtodynError {
    ProtodynError::Encode(format!(
        "{}.{}: expected {expected} value, got {}",
        ty.full_name(),
        field.name,
        got.kind_name()
    ))
}
