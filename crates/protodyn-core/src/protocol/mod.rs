//! Byte-level formats.
//!
//! - `wire`: protobuf varint/tag/fixed-width primitives over `bytes::Buf`.
//! - `envelope`: CloudEvents JSON record carrying an encoded payload.
//!
//! All readers are panic-free: malformed input is reported as
//! `ProtodynError` instead of indexing raw buffers.

pub mod envelope;
pub mod wire;
