//! Dynamic protobuf codec.
//!
//! Decoding and encoding are pure functions of (bytes, type) and
//! (value, type). Dispatch is a closed match over [`FieldKind`]; no code is
//! generated per message type.
//!
//! [`FieldKind`]: crate::descriptor::FieldKind

pub mod decode;
pub mod encode;

pub use decode::decode;
pub use encode::{encode, encode_message, encode_static};
