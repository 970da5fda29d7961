//! Structural type metadata: files, messages, fields and enums.
//!
//! Descriptors are plain owned data. Cross references between types are kept
//! as fully-qualified names and resolved through a [`DescriptorPool`], so the
//! same codec works whether the descriptors were compiled in or loaded from a
//! descriptor set at runtime.

use crate::error::{ProtodynError, Result};
use crate::protocol::wire::WireType;

/// Source syntax of a file; decides the default packing of repeated scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Proto2,
    Proto3,
}

impl Syntax {
    pub fn as_str(self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
        }
    }
}

/// Semantic type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    /// Nested message, by fully-qualified name.
    Message(String),
    /// Enum, by fully-qualified name.
    Enum(String),
}

impl FieldKind {
    /// Wire type used for a single (unpacked) value of this kind.
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldKind::Int32
            | FieldKind::Int64
            | FieldKind::Uint32
            | FieldKind::Uint64
            | FieldKind::Sint32
            | FieldKind::Sint64
            | FieldKind::Bool
            | FieldKind::Enum(_) => WireType::Varint,
            FieldKind::Fixed32 | FieldKind::Sfixed32 | FieldKind::Float => WireType::Fixed32,
            FieldKind::Fixed64 | FieldKind::Sfixed64 | FieldKind::Double => WireType::Fixed64,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message(_) => {
                WireType::LengthDelimited
            }
        }
    }

    /// Scalars that may be packed into a single length-delimited block.
    pub fn is_packable(&self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    /// Kinds allowed as map keys.
    pub fn is_map_key(&self) -> bool {
        !matches!(
            self,
            FieldKind::Double
                | FieldKind::Float
                | FieldKind::Bytes
                | FieldKind::Message(_)
                | FieldKind::Enum(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Double => "double",
            FieldKind::Float => "float",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Uint32 => "uint32",
            FieldKind::Uint64 => "uint64",
            FieldKind::Sint32 => "sint32",
            FieldKind::Sint64 => "sint64",
            FieldKind::Fixed32 => "fixed32",
            FieldKind::Fixed64 => "fixed64",
            FieldKind::Sfixed32 => "sfixed32",
            FieldKind::Sfixed64 => "sfixed64",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Message(_) => "message",
            FieldKind::Enum(_) => "enum",
        }
    }
}

/// How many values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Singular,
    Repeated,
    /// Repeated synthetic entry message with `key` = 1 and `value` = 2.
    Map,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub number: u32,
    pub name: String,
    pub kind: FieldKind,
    pub cardinality: Cardinality,
    /// Index into the owning message's `oneofs`.
    pub oneof: Option<usize>,
    /// Repeated scalars are written as one length-delimited block.
    pub packed: bool,
    /// Singular field that is written whenever it is set, even to its
    /// default (proto2 fields, proto3 `optional` and oneof members).
    pub presence: bool,
}

impl FieldDescriptor {
    pub fn singular(number: u32, name: &str, kind: FieldKind) -> Self {
        Self {
            number,
            name: name.to_string(),
            kind,
            cardinality: Cardinality::Singular,
            oneof: None,
            packed: false,
            presence: false,
        }
    }

    /// Repeated field; scalars default to packed.
    pub fn repeated(number: u32, name: &str, kind: FieldKind) -> Self {
        let packed = kind.is_packable();
        Self {
            number,
            name: name.to_string(),
            kind,
            cardinality: Cardinality::Repeated,
            oneof: None,
            packed,
            presence: false,
        }
    }

    /// Map field whose entries are described by `entry` (fully-qualified).
    pub fn map(number: u32, name: &str, entry: &str) -> Self {
        Self {
            number,
            name: name.to_string(),
            kind: FieldKind::Message(entry.to_string()),
            cardinality: Cardinality::Map,
            oneof: None,
            packed: false,
            presence: false,
        }
    }

    /// Oneof members always track presence.
    pub fn in_oneof(mut self, index: usize) -> Self {
        self.oneof = Some(index);
        self.presence = true;
        self
    }

    pub fn with_presence(mut self, presence: bool) -> Self {
        self.presence = presence && self.cardinality == Cardinality::Singular;
        self
    }

    pub fn with_packed(mut self, packed: bool) -> Self {
        self.packed = packed && self.cardinality == Cardinality::Repeated && self.kind.is_packable();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    pub full_name: String,
    /// Sorted by field number.
    pub fields: Vec<FieldDescriptor>,
    pub oneofs: Vec<String>,
    pub map_entry: bool,
}

impl MessageDescriptor {
    pub fn new(full_name: &str, mut fields: Vec<FieldDescriptor>) -> Self {
        fields.sort_by_key(|f| f.number);
        Self {
            full_name: full_name.to_string(),
            fields,
            oneofs: Vec::new(),
            map_entry: false,
        }
    }

    pub fn with_oneofs(mut self, oneofs: &[&str]) -> Self {
        self.oneofs = oneofs.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Synthetic map entry `{ key = 1; value = 2; }`.
    pub fn map_entry(full_name: &str, key: FieldKind, value: FieldKind) -> Self {
        let mut desc = Self::new(
            full_name,
            vec![
                FieldDescriptor::singular(1, "key", key),
                FieldDescriptor::singular(2, "value", value),
            ],
        );
        desc.map_entry = true;
        desc
    }

    pub fn field(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields
            .binary_search_by_key(&number, |f| f.number)
            .ok()
            .and_then(|i| self.fields.get(i))
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.full_name)
    }

    /// Fields that belong to oneof group `index`.
    pub fn oneof_members(&self, index: usize) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.oneof == Some(index))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub full_name: String,
    pub values: Vec<EnumValue>,
}

impl EnumDescriptor {
    pub fn new(full_name: &str, values: &[(&str, i32)]) -> Self {
        Self {
            full_name: full_name.to_string(),
            values: values
                .iter()
                .map(|(name, number)| EnumValue {
                    name: name.to_string(),
                    number: *number,
                })
                .collect(),
        }
    }

    /// First symbol declared for `number` (aliases resolve to the first one).
    pub fn name_of(&self, number: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.number == number)
            .map(|v| v.name.as_str())
    }

    pub fn number_of(&self, name: &str) -> Option<i32> {
        self.values.iter().find(|v| v.name == name).map(|v| v.number)
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.full_name)
    }
}

/// One `.proto` file worth of declarations, flattened to fully-qualified names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub package: String,
    pub syntax: Syntax,
    pub dependencies: Vec<String>,
    pub messages: Vec<MessageDescriptor>,
    pub enums: Vec<EnumDescriptor>,
}

pub(crate) fn simple_name(full_name: &str) -> &str {
    full_name.rsplit('.').next().unwrap_or(full_name)
}

/// Lookup of descriptors by fully-qualified name.
pub trait DescriptorPool {
    fn message(&self, full_name: &str) -> Option<&MessageDescriptor>;
    fn enumeration(&self, full_name: &str) -> Option<&EnumDescriptor>;
}

/// A resolved message descriptor together with the pool that resolves the
/// types it references.
#[derive(Clone, Copy)]
pub struct MessageType<'a> {
    descriptor: &'a MessageDescriptor,
    pool: &'a dyn DescriptorPool,
}

impl<'a> MessageType<'a> {
    pub fn new(descriptor: &'a MessageDescriptor, pool: &'a dyn DescriptorPool) -> Self {
        Self { descriptor, pool }
    }

    /// Resolve `full_name` in `pool`.
    pub fn lookup(pool: &'a dyn DescriptorPool, full_name: &str) -> Result<Self> {
        pool.message(full_name)
            .map(|descriptor| Self { descriptor, pool })
            .ok_or_else(|| ProtodynError::TypeNotFound(full_name.to_string()))
    }

    pub fn descriptor(&self) -> &'a MessageDescriptor {
        self.descriptor
    }

    pub fn pool(&self) -> &'a dyn DescriptorPool {
        self.pool
    }

    pub fn full_name(&self) -> &'a str {
        &self.descriptor.full_name
    }

    /// Message type referenced by a message or map field.
    pub fn nested(&self, field: &FieldDescriptor) -> Result<MessageType<'a>> {
        match &field.kind {
            FieldKind::Message(name) => Self::lookup(self.pool, name),
            other => Err(ProtodynError::TypeNotFound(format!(
                "{}.{} is {}, not a message",
                self.descriptor.full_name,
                field.name,
                other.name()
            ))),
        }
    }

    pub fn enumeration(&self, full_name: &str) -> Result<&'a EnumDescriptor> {
        self.pool
            .enumeration(full_name)
            .ok_or_else(|| ProtodynError::TypeNotFound(full_name.to_string()))
    }
}

impl std::fmt::Debug for MessageType<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MessageType")
            .field(&self.descriptor.full_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_sorted_and_found_by_number() {
        let desc = MessageDescriptor::new(
            "pkg.M",
            vec![
                FieldDescriptor::singular(7, "b", FieldKind::Bool),
                FieldDescriptor::singular(2, "a", FieldKind::String),
            ],
        );
        assert_eq!(desc.fields[0].number, 2);
        assert_eq!(desc.field(7).map(|f| f.name.as_str()), Some("b"));
        assert!(desc.field(3).is_none());
        assert_eq!(desc.simple_name(), "M");
    }

    #[test]
    fn repeated_strings_are_never_packed() {
        let f = FieldDescriptor::repeated(1, "tags", FieldKind::String).with_packed(true);
        assert!(!f.packed);
        let g = FieldDescriptor::repeated(2, "ids", FieldKind::Sint64);
        assert!(g.packed);
    }

    #[test]
    fn enum_aliases_resolve_to_first_symbol() {
        let e = EnumDescriptor::new("pkg.E", &[("A", 0), ("B", 1), ("ALIAS_B", 1)]);
        assert_eq!(e.name_of(1), Some("B"));
        assert_eq!(e.number_of("ALIAS_B"), Some(1));
        assert_eq!(e.name_of(9), None);
    }
}
