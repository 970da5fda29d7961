//! Compiled-in description of the parts of `google/protobuf/descriptor.proto`
//! needed to read and write descriptor sets with the dynamic codec.
//!
//! Field numbers follow descriptor.proto; everything not listed here (source
//! info, extensions, reserved ranges, most options) is skipped on decode.

use crate::descriptor::{EnumDescriptor, FieldDescriptor, FieldKind, MessageDescriptor};
use crate::schema::pool::TypePool;

pub const FILE_DESCRIPTOR_SET: &str = "google.protobuf.FileDescriptorSet";
pub const FILE_DESCRIPTOR_PROTO: &str = "google.protobuf.FileDescriptorProto";
pub const DESCRIPTOR_PROTO: &str = "google.protobuf.DescriptorProto";
pub const FIELD_DESCRIPTOR_PROTO: &str = "google.protobuf.FieldDescriptorProto";
pub const ONEOF_DESCRIPTOR_PROTO: &str = "google.protobuf.OneofDescriptorProto";
pub const ENUM_DESCRIPTOR_PROTO: &str = "google.protobuf.EnumDescriptorProto";
pub const ENUM_VALUE_DESCRIPTOR_PROTO: &str = "google.protobuf.EnumValueDescriptorProto";
pub const MESSAGE_OPTIONS: &str = "google.protobuf.MessageOptions";
pub const FIELD_OPTIONS: &str = "google.protobuf.FieldOptions";
pub const FIELD_LABEL: &str = "google.protobuf.FieldDescriptorProto.Label";
pub const FIELD_TYPE: &str = "google.protobuf.FieldDescriptorProto.Type";

pub mod file {
    pub const NAME: u32 = 1;
    pub const PACKAGE: u32 = 2;
    pub const DEPENDENCY: u32 = 3;
    pub const MESSAGE_TYPE: u32 = 4;
    pub const ENUM_TYPE: u32 = 5;
    pub const SYNTAX: u32 = 12;
}

pub mod message {
    pub const NAME: u32 = 1;
    pub const FIELD: u32 = 2;
    pub const NESTED_TYPE: u32 = 3;
    pub const ENUM_TYPE: u32 = 4;
    pub const OPTIONS: u32 = 7;
    pub const ONEOF_DECL: u32 = 8;
    /// `MessageOptions.map_entry`
    pub const MAP_ENTRY: u32 = 7;
}

pub mod field {
    pub const NAME: u32 = 1;
    pub const NUMBER: u32 = 3;
    pub const LABEL: u32 = 4;
    pub const TYPE: u32 = 5;
    pub const TYPE_NAME: u32 = 6;
    pub const OPTIONS: u32 = 8;
    pub const ONEOF_INDEX: u32 = 9;
    pub const PROTO3_OPTIONAL: u32 = 17;
    /// `FieldOptions.packed`
    pub const PACKED: u32 = 2;

    pub const LABEL_OPTIONAL: i32 = 1;
    pub const LABEL_REQUIRED: i32 = 2;
    pub const LABEL_REPEATED: i32 = 3;

    pub const TYPE_GROUP: i32 = 10;
    pub const TYPE_MESSAGE: i32 = 11;
    pub const TYPE_ENUM: i32 = 14;
}

pub mod enumeration {
    pub const NAME: u32 = 1;
    pub const VALUE: u32 = 2;
    pub const VALUE_NAME: u32 = 1;
    pub const VALUE_NUMBER: u32 = 2;
}

/// `FieldDescriptorProto.Type` numbers, in declaration order.
const TYPES: &[(&str, i32)] = &[
    ("TYPE_DOUBLE", 1),
    ("TYPE_FLOAT", 2),
    ("TYPE_INT64", 3),
    ("TYPE_UINT64", 4),
    ("TYPE_INT32", 5),
    ("TYPE_FIXED64", 6),
    ("TYPE_FIXED32", 7),
    ("TYPE_BOOL", 8),
    ("TYPE_STRING", 9),
    ("TYPE_GROUP", 10),
    ("TYPE_MESSAGE", 11),
    ("TYPE_BYTES", 12),
    ("TYPE_UINT32", 13),
    ("TYPE_ENUM", 14),
    ("TYPE_SFIXED32", 15),
    ("TYPE_SFIXED64", 16),
    ("TYPE_SINT32", 17),
    ("TYPE_SINT64", 18),
];

/// Map a `FieldDescriptorProto.Type` number to a scalar kind. Message, enum
/// and group types return `None`; they need the referenced type name.
pub fn scalar_kind(type_id: i32) -> Option<FieldKind> {
    let kind = match type_id {
        1 => FieldKind::Double,
        2 => FieldKind::Float,
        3 => FieldKind::Int64,
        4 => FieldKind::Uint64,
        5 => FieldKind::Int32,
        6 => FieldKind::Fixed64,
        7 => FieldKind::Fixed32,
        8 => FieldKind::Bool,
        9 => FieldKind::String,
        12 => FieldKind::Bytes,
        13 => FieldKind::Uint32,
        15 => FieldKind::Sfixed32,
        16 => FieldKind::Sfixed64,
        17 => FieldKind::Sint32,
        18 => FieldKind::Sint64,
        _ => return None,
    };
    Some(kind)
}

pub fn type_id(kind: &FieldKind) -> i32 {
    match kind {
        FieldKind::Double => 1,
        FieldKind::Float => 2,
        FieldKind::Int64 => 3,
        FieldKind::Uint64 => 4,
        FieldKind::Int32 => 5,
        FieldKind::Fixed64 => 6,
        FieldKind::Fixed32 => 7,
        FieldKind::Bool => 8,
        FieldKind::String => 9,
        FieldKind::Message(_) => field::TYPE_MESSAGE,
        FieldKind::Bytes => 12,
        FieldKind::Uint32 => 13,
        FieldKind::Enum(_) => field::TYPE_ENUM,
        FieldKind::Sfixed32 => 15,
        FieldKind::Sfixed64 => 16,
        FieldKind::Sint32 => 17,
        FieldKind::Sint64 => 18,
    }
}

fn optional(number: u32, name: &str, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor::singular(number, name, kind).with_presence(true)
}

fn repeated_message(number: u32, name: &str, full_name: &str) -> FieldDescriptor {
    FieldDescriptor::repeated(number, name, FieldKind::Message(full_name.to_string()))
}

/// Pool holding the descriptor.proto subset (proto2: every singular field
/// tracks presence, repeated scalars are unpacked).
pub fn pool() -> TypePool {
    let mut pool = TypePool::new();

    pool.add_message(MessageDescriptor::new(
        FILE_DESCRIPTOR_SET,
        vec![repeated_message(1, "file", FILE_DESCRIPTOR_PROTO)],
    ));

    pool.add_message(MessageDescriptor::new(
        FILE_DESCRIPTOR_PROTO,
        vec![
            optional(file::NAME, "name", FieldKind::String),
            optional(file::PACKAGE, "package", FieldKind::String),
            FieldDescriptor::repeated(file::DEPENDENCY, "dependency", FieldKind::String),
            repeated_message(file::MESSAGE_TYPE, "message_type", DESCRIPTOR_PROTO),
            repeated_message(file::ENUM_TYPE, "enum_type", ENUM_DESCRIPTOR_PROTO),
            optional(file::SYNTAX, "syntax", FieldKind::String),
        ],
    ));

    pool.add_message(MessageDescriptor::new(
        DESCRIPTOR_PROTO,
        vec![
            optional(message::NAME, "name", FieldKind::String),
            repeated_message(message::FIELD, "field", FIELD_DESCRIPTOR_PROTO),
            repeated_message(message::NESTED_TYPE, "nested_type", DESCRIPTOR_PROTO),
            repeated_message(message::ENUM_TYPE, "enum_type", ENUM_DESCRIPTOR_PROTO),
            optional(
                message::OPTIONS,
                "options",
                FieldKind::Message(MESSAGE_OPTIONS.to_string()),
            ),
            repeated_message(message::ONEOF_DECL, "oneof_decl", ONEOF_DESCRIPTOR_PROTO),
        ],
    ));

    pool.add_message(MessageDescriptor::new(
        FIELD_DESCRIPTOR_PROTO,
        vec![
            optional(field::NAME, "name", FieldKind::String),
            optional(field::NUMBER, "number", FieldKind::Int32),
            optional(field::LABEL, "label", FieldKind::Enum(FIELD_LABEL.to_string())),
            optional(field::TYPE, "type", FieldKind::Enum(FIELD_TYPE.to_string())),
            optional(field::TYPE_NAME, "type_name", FieldKind::String),
            optional(
                field::OPTIONS,
                "options",
                FieldKind::Message(FIELD_OPTIONS.to_string()),
            ),
            optional(field::ONEOF_INDEX, "oneof_index", FieldKind::Int32),
            optional(field::PROTO3_OPTIONAL, "proto3_optional", FieldKind::Bool),
        ],
    ));

    pool.add_message(MessageDescriptor::new(
        ONEOF_DESCRIPTOR_PROTO,
        vec![optional(1, "name", FieldKind::String)],
    ));

    pool.add_message(MessageDescriptor::new(
        ENUM_DESCRIPTOR_PROTO,
        vec![
            optional(enumeration::NAME, "name", FieldKind::String),
            repeated_message(enumeration::VALUE, "value", ENUM_VALUE_DESCRIPTOR_PROTO),
        ],
    ));

    pool.add_message(MessageDescriptor::new(
        ENUM_VALUE_DESCRIPTOR_PROTO,
        vec![
            optional(enumeration::VALUE_NAME, "name", FieldKind::String),
            optional(enumeration::VALUE_NUMBER, "number", FieldKind::Int32),
        ],
    ));

    pool.add_message(MessageDescriptor::new(
        MESSAGE_OPTIONS,
        vec![optional(message::MAP_ENTRY, "map_entry", FieldKind::Bool)],
    ));

    pool.add_message(MessageDescriptor::new(
        FIELD_OPTIONS,
        vec![optional(field::PACKED, "packed", FieldKind::Bool)],
    ));

    pool.add_enum(EnumDescriptor::new(
        FIELD_LABEL,
        &[
            ("LABEL_OPTIONAL", field::LABEL_OPTIONAL),
            ("LABEL_REQUIRED", field::LABEL_REQUIRED),
            ("LABEL_REPEATED", field::LABEL_REPEATED),
        ],
    ));
    pool.add_enum(EnumDescriptor::new(FIELD_TYPE, TYPES));

    pool
}
