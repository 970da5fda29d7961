//! Protobuf wire primitives (panic-free).
//!
//! Parsing rules:
//! - Never index (`buf[0]`); read through `Buf` after `remaining()` checks.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.

use bytes::{Buf, BufMut};

use crate::error::{ProtodynError, Result};

/// Largest field number the wire format can carry.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Maximum nesting of messages and groups accepted by the decoder.
pub const RECURSION_LIMIT: usize = 100;

/// Low three bits of a field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    StartGroup,
    EndGroup,
    Fixed32,
}

impl WireType {
    pub fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(malformed(format!("unknown wire type {other}"))),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::Fixed32 => 5,
        }
    }
}

fn malformed(msg: String) -> ProtodynError {
    ProtodynError::MalformedWireData(msg)
}

/// Read a base-128 varint (at most 10 bytes).
pub fn read_varint(buf: &mut impl Buf) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..10 {
        if !buf.has_remaining() {
            return Err(malformed("truncated varint".into()));
        }
        let byte = buf.get_u8();
        if i == 9 && byte > 1 {
            return Err(malformed("varint overflows 64 bits".into()));
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(malformed("varint longer than 10 bytes".into()))
}

pub fn write_varint(buf: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Number of bytes `write_varint` emits for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

pub fn zigzag_encode32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

pub fn zigzag_decode32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

pub fn zigzag_encode64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

pub fn zigzag_decode64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Read a field key and split it into (field number, wire type).
pub fn read_tag(buf: &mut impl Buf) -> Result<(u32, WireType)> {
    let key = read_varint(buf)?;
    let number = key >> 3;
    if number == 0 || number > u64::from(MAX_FIELD_NUMBER) {
        return Err(malformed(format!("invalid field number {number}")));
    }
    let wire_type = WireType::from_bits((key & 0x07) as u8)?;
    Ok((number as u32, wire_type))
}

pub fn write_tag(buf: &mut impl BufMut, number: u32, wire_type: WireType) {
    write_varint(buf, (u64::from(number) << 3) | u64::from(wire_type.bits()));
}

pub fn read_fixed32(buf: &mut impl Buf) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(malformed("truncated fixed32".into()));
    }
    Ok(buf.get_u32_le())
}

pub fn read_fixed64(buf: &mut impl Buf) -> Result<u64> {
    if buf.remaining() < 8 {
        return Err(malformed("truncated fixed64".into()));
    }
    Ok(buf.get_u64_le())
}

/// Read a length prefix and return the delimited slice (zero-copy).
pub fn read_length_delimited<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = read_varint(buf)?;
    let remaining = buf.remaining();
    if len > remaining as u64 {
        return Err(malformed(format!(
            "length-delimited field declares {len} bytes but only {remaining} remain"
        )));
    }
    let (head, tail) = buf.split_at(len as usize);
    *buf = tail;
    Ok(head)
}

pub fn write_length_delimited(buf: &mut impl BufMut, data: &[u8]) {
    write_varint(buf, data.len() as u64);
    buf.put_slice(data);
}

/// Skip the value of a field whose key was already consumed.
pub fn skip_field(buf: &mut &[u8], number: u32, wire_type: WireType) -> Result<()> {
    skip_field_at(buf, number, wire_type, 0)
}

fn skip_field_at(buf: &mut &[u8], number: u32, wire_type: WireType, depth: usize) -> Result<()> {
    match wire_type {
        WireType::Varint => {
            read_varint(buf)?;
        }
        WireType::Fixed64 => {
            read_fixed64(buf)?;
        }
        WireType::Fixed32 => {
            read_fixed32(buf)?;
        }
        WireType::LengthDelimited => {
            read_length_delimited(buf)?;
        }
        WireType::StartGroup => {
            if depth >= RECURSION_LIMIT {
                return Err(malformed("group nesting exceeds recursion limit".into()));
            }
            loop {
                let (inner, inner_type) = read_tag(buf)?;
                if inner_type == WireType::EndGroup {
                    if inner != number {
                        return Err(malformed(format!(
                            "end-group {inner} does not match start-group {number}"
                        )));
                    }
                    break;
                }
                skip_field_at(buf, inner, inner_type, depth + 1)?;
            }
        }
        WireType::EndGroup => {
            return Err(malformed(format!("unexpected end-group for field {number}")));
        }
    }
    Ok(())
}
