//! protodyn core: schema-driven protobuf codec, JSON projection and event
//! envelope.
//!
//! Message types are described at runtime (a loaded descriptor set or the
//! compiled-in sample catalog); values are generic trees, so no per-type
//! code is generated. The crate performs no I/O.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Every fallible
//! path surfaces as `ProtodynError`/`Result`, so malformed wire data or a bad
//! schema never crashes the caller.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod json;
pub mod protocol;
pub mod sample;
pub mod schema;
pub mod value;

pub use codec::{decode, encode, encode_message, encode_static};
pub use descriptor::{DescriptorPool, MessageType};
/// Shared result type.
pub use error::{ErrorCode, ProtodynError, Result};
pub use json::{from_json, to_json};
pub use protocol::envelope::Envelope;
pub use schema::{Naming, Registry, Resolver, SchemaRef, StaticCatalog, StaticMessage};
pub use value::{MessageValue, Value};
