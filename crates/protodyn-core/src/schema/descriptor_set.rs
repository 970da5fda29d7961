//! Conversion between serialized `FileDescriptorSet`s and [`FileDescriptor`]s.
//!
//! Both directions run through the dynamic codec against the bootstrap pool.

use std::collections::HashMap;

use bytes::Bytes;

use crate::codec;
use crate::descriptor::{
    Cardinality, EnumDescriptor, EnumValue, FieldDescriptor, FieldKind, FileDescriptor,
    MessageDescriptor, MessageType, Syntax,
};
use crate::error::{ProtodynError, Result};
use crate::protocol::wire::MAX_FIELD_NUMBER;
use crate::schema::bootstrap::{self, enumeration, field, file, message};
use crate::value::{MessageValue, Value};

/// Decode a serialized descriptor set into flattened file descriptors.
/// References are resolved but not linked; see `TypePool::link`.
pub fn parse(bytes: &[u8]) -> Result<Vec<FileDescriptor>> {
    let pool = bootstrap::pool();
    let ty = MessageType::lookup(&pool, bootstrap::FILE_DESCRIPTOR_SET)?;
    let set = codec::decode(bytes, ty)
        .map_err(|e| load_err(format!("invalid descriptor set: {e}")))?;

    let raw_files = match set.as_message() {
        Some(set) => messages_at(set, 1)
            .map(RawFile::read)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let mut declared = HashMap::new();
    for f in &raw_files {
        for m in &f.messages {
            declared.insert(m.full_name.clone(), Declared::Message { map_entry: m.map_entry });
        }
        for e in &f.enums {
            declared.insert(e.full_name.clone(), Declared::Enum);
        }
    }

    raw_files
        .into_iter()
        .map(|f| f.into_descriptor(&declared))
        .collect()
}

/// Serialize file descriptors back into a `FileDescriptorSet`, rebuilding
/// the nesting of messages and enums from their qualified names.
pub fn encode(files: &[FileDescriptor]) -> Result<Bytes> {
    let pool = bootstrap::pool();
    let ty = MessageType::lookup(&pool, bootstrap::FILE_DESCRIPTOR_SET)?;
    let files = files.iter().map(|f| Value::Message(file_value(f))).collect();
    codec::encode_message(&MessageValue::new().with(1, Value::List(files)), ty)
}

#[derive(Debug, Clone, Copy)]
enum Declared {
    Message { map_entry: bool },
    Enum,
}

struct RawFile {
    name: String,
    package: String,
    syntax: Syntax,
    dependencies: Vec<String>,
    messages: Vec<RawMessage>,
    enums: Vec<EnumDescriptor>,
}

struct RawMessage {
    full_name: String,
    fields: Vec<RawField>,
    oneofs: Vec<String>,
    map_entry: bool,
}

struct RawField {
    name: String,
    number: i64,
    label: i32,
    type_id: i32,
    type_name: Option<String>,
    oneof: Option<i64>,
    packed: Option<bool>,
    proto3_optional: bool,
}

impl RawFile {
    fn read(proto: &MessageValue) -> Result<Self> {
        let name = string_at(proto, file::NAME)
            .ok_or_else(|| load_err("file descriptor without a name".into()))?
            .to_string();
        let package = string_at(proto, file::PACKAGE).unwrap_or_default().to_string();
        let syntax = match string_at(proto, file::SYNTAX).unwrap_or_default() {
            "" | "proto2" => Syntax::Proto2,
            // editions default to packed scalars and implicit presence
            "proto3" | "editions" => Syntax::Proto3,
            other => return Err(load_err(format!("{name}: unsupported syntax '{other}'"))),
        };
        let dependencies = list_at(proto, file::DEPENDENCY)
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();

        let mut messages = Vec::new();
        let mut enums = Vec::new();
        for m in messages_at(proto, file::MESSAGE_TYPE) {
            read_message(m, &package, &mut messages, &mut enums)?;
        }
        for e in messages_at(proto, file::ENUM_TYPE) {
            enums.push(read_enum(e, &package)?);
        }

        Ok(Self {
            name,
            package,
            syntax,
            dependencies,
            messages,
            enums,
        })
    }

    fn into_descriptor(self, declared: &HashMap<String, Declared>) -> Result<FileDescriptor> {
        let syntax = self.syntax;
        let messages = self
            .messages
            .into_iter()
            .map(|m| m.into_descriptor(syntax, declared))
            .collect::<Result<Vec<_>>>()?;
        Ok(FileDescriptor {
            name: self.name,
            package: self.package,
            syntax,
            dependencies: self.dependencies,
            messages,
            enums: self.enums,
        })
    }
}

/// Flatten a message and everything nested in it into `messages` / `enums`.
fn read_message(
    proto: &MessageValue,
    scope: &str,
    messages: &mut Vec<RawMessage>,
    enums: &mut Vec<EnumDescriptor>,
) -> Result<()> {
    let name = string_at(proto, message::NAME)
        .ok_or_else(|| load_err(format!("message without a name in '{scope}'")))?;
    let full_name = qualify(scope, name);

    let fields = messages_at(proto, message::FIELD)
        .map(|f| RawField::read(f, &full_name))
        .collect::<Result<Vec<_>>>()?;
    let oneofs = messages_at(proto, message::ONEOF_DECL)
        .map(|o| string_at(o, 1).unwrap_or_default().to_string())
        .collect();
    let map_entry = message_at(proto, message::OPTIONS)
        .and_then(|o| o.get(message::MAP_ENTRY))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    for nested in messages_at(proto, message::NESTED_TYPE) {
        read_message(nested, &full_name, messages, enums)?;
    }
    for e in messages_at(proto, message::ENUM_TYPE) {
        enums.push(read_enum(e, &full_name)?);
    }

    messages.push(RawMessage {
        full_name,
        fields,
        oneofs,
        map_entry,
    });
    Ok(())
}

fn read_enum(proto: &MessageValue, scope: &str) -> Result<EnumDescriptor> {
    let name = string_at(proto, enumeration::NAME)
        .ok_or_else(|| load_err(format!("enum without a name in '{scope}'")))?;
    let values = messages_at(proto, enumeration::VALUE)
        .map(|v| EnumValue {
            name: string_at(v, enumeration::VALUE_NAME).unwrap_or_default().to_string(),
            number: v
                .get(enumeration::VALUE_NUMBER)
                .and_then(Value::as_i64)
                .and_then(|n| i32::try_from(n).ok())
                .unwrap_or(0),
        })
        .collect();
    Ok(EnumDescriptor {
        full_name: qualify(scope, name),
        values,
    })
}

impl RawField {
    fn read(proto: &MessageValue, owner: &str) -> Result<Self> {
        let name = string_at(proto, field::NAME)
            .ok_or_else(|| load_err(format!("{owner}: field without a name")))?
            .to_string();
        Ok(Self {
            number: proto.get(field::NUMBER).and_then(Value::as_i64).unwrap_or(0),
            label: proto
                .get(field::LABEL)
                .and_then(Value::as_enum)
                .unwrap_or(field::LABEL_OPTIONAL),
            type_id: proto.get(field::TYPE).and_then(Value::as_enum).unwrap_or(0),
            type_name: string_at(proto, field::TYPE_NAME).map(str::to_string),
            oneof: proto.get(field::ONEOF_INDEX).and_then(Value::as_i64),
            packed: message_at(proto, field::OPTIONS)
                .and_then(|o| o.get(field::PACKED))
                .and_then(Value::as_bool),
            proto3_optional: proto
                .get(field::PROTO3_OPTIONAL)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            name,
        })
    }
}

impl RawMessage {
    fn into_descriptor(
        self,
        syntax: Syntax,
        declared: &HashMap<String, Declared>,
    ) -> Result<MessageDescriptor> {
        let fields = self
            .fields
            .iter()
            .map(|f| self.field_descriptor(f, syntax, declared))
            .collect::<Result<Vec<_>>>()?;
        let mut desc = MessageDescriptor::new(&self.full_name, fields);
        desc.oneofs = self.oneofs;
        desc.map_entry = self.map_entry;
        Ok(desc)
    }

    fn field_descriptor(
        &self,
        raw: &RawField,
        syntax: Syntax,
        declared: &HashMap<String, Declared>,
    ) -> Result<FieldDescriptor> {
        let at = format!("{}.{}", self.full_name, raw.name);
        let number = u32::try_from(raw.number)
            .ok()
            .filter(|n| (1..=MAX_FIELD_NUMBER).contains(n))
            .ok_or_else(|| load_err(format!("{at}: invalid field number {}", raw.number)))?;

        let kind = match raw.type_id {
            field::TYPE_GROUP => {
                return Err(load_err(format!("{at}: group fields are not supported")))
            }
            // type may be omitted when type_name is set
            0 | field::TYPE_MESSAGE | field::TYPE_ENUM => {
                let type_name = raw
                    .type_name
                    .as_deref()
                    .ok_or_else(|| load_err(format!("{at}: missing type name")))?;
                let (target, what) = resolve_reference(type_name, &self.full_name, declared)
                    .ok_or_else(|| load_err(format!("{at}: unknown type {type_name}")))?;
                match (what, raw.type_id) {
                    (Declared::Message { .. }, field::TYPE_ENUM)
                    | (Declared::Enum, field::TYPE_MESSAGE) => {
                        return Err(load_err(format!(
                            "{at}: type {type_name} does not match the declared field type"
                        )))
                    }
                    (Declared::Message { .. }, _) => FieldKind::Message(target),
                    (Declared::Enum, _) => FieldKind::Enum(target),
                }
            }
            other => bootstrap::scalar_kind(other)
                .ok_or_else(|| load_err(format!("{at}: unknown field type {other}")))?,
        };

        let cardinality = match (raw.label, &kind) {
            (field::LABEL_REPEATED, FieldKind::Message(target))
                if matches!(declared.get(target), Some(Declared::Message { map_entry: true })) =>
            {
                Cardinality::Map
            }
            (field::LABEL_REPEATED, _) => Cardinality::Repeated,
            _ => Cardinality::Singular,
        };

        let mut desc = FieldDescriptor {
            number,
            name: raw.name.clone(),
            kind,
            cardinality,
            oneof: None,
            packed: false,
            presence: false,
        };
        desc = desc.with_packed(raw.packed.unwrap_or(syntax == Syntax::Proto3));
        desc = desc.with_presence(syntax == Syntax::Proto2 || raw.proto3_optional);
        if let Some(index) = raw.oneof {
            let index = usize::try_from(index)
                .map_err(|_| load_err(format!("{at}: invalid oneof index {index}")))?;
            desc = desc.in_oneof(index);
        }
        Ok(desc)
    }
}

/// Resolve a `type_name` from a field of message `scope`. Leading-dot names
/// are fully qualified; others are looked up from the innermost scope out.
fn resolve_reference(
    type_name: &str,
    scope: &str,
    declared: &HashMap<String, Declared>,
) -> Option<(String, Declared)> {
    if let Some(full) = type_name.strip_prefix('.') {
        return declared.get(full).map(|d| (full.to_string(), *d));
    }
    let mut scope = scope;
    loop {
        let candidate = qualify(scope, type_name);
        if let Some(d) = declared.get(&candidate) {
            return Some((candidate, *d));
        }
        if scope.is_empty() {
            return None;
        }
        scope = parent_scope(scope);
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

fn parent_scope(full_name: &str) -> &str {
    full_name.rsplit_once('.').map(|(scope, _)| scope).unwrap_or("")
}

fn file_value(f: &FileDescriptor) -> MessageValue {
    let mut v = MessageValue::new().with(file::NAME, Value::String(f.name.clone()));
    if !f.package.is_empty() {
        v.set(file::PACKAGE, Value::String(f.package.clone()));
    }
    let deps = f.dependencies.iter().cloned().map(Value::String).collect();
    v.set(file::DEPENDENCY, Value::List(deps));
    v.set(
        file::MESSAGE_TYPE,
        Value::List(nested_messages(f, &f.package)),
    );
    v.set(file::ENUM_TYPE, Value::List(nested_enums(f, &f.package)));
    if f.syntax == Syntax::Proto3 {
        v.set(file::SYNTAX, Value::String(f.syntax.as_str().into()));
    }
    v
}

fn nested_messages(f: &FileDescriptor, scope: &str) -> Vec<Value> {
    f.messages
        .iter()
        .filter(|m| parent_scope(&m.full_name) == scope)
        .map(|m| Value::Message(message_value(f, m)))
        .collect()
}

fn nested_enums(f: &FileDescriptor, scope: &str) -> Vec<Value> {
    f.enums
        .iter()
        .filter(|e| parent_scope(&e.full_name) == scope)
        .map(|e| Value::Message(enum_value(e)))
        .collect()
}

fn message_value(f: &FileDescriptor, m: &MessageDescriptor) -> MessageValue {
    let fields = m
        .fields
        .iter()
        .map(|fd| Value::Message(field_value(fd, f.syntax)))
        .collect();
    let oneofs = m
        .oneofs
        .iter()
        .map(|name| Value::Message(MessageValue::new().with(1, Value::String(name.clone()))))
        .collect();

    let mut v = MessageValue::new()
        .with(message::NAME, Value::String(m.simple_name().to_string()))
        .with(message::FIELD, Value::List(fields))
        .with(message::NESTED_TYPE, Value::List(nested_messages(f, &m.full_name)))
        .with(message::ENUM_TYPE, Value::List(nested_enums(f, &m.full_name)))
        .with(message::ONEOF_DECL, Value::List(oneofs));
    if m.map_entry {
        let options = MessageValue::new().with(message::MAP_ENTRY, Value::Bool(true));
        v.set(message::OPTIONS, Value::Message(options));
    }
    v
}

fn field_value(fd: &FieldDescriptor, syntax: Syntax) -> MessageValue {
    let label = match fd.cardinality {
        Cardinality::Singular => field::LABEL_OPTIONAL,
        Cardinality::Repeated | Cardinality::Map => field::LABEL_REPEATED,
    };
    let mut v = MessageValue::new()
        .with(field::NAME, Value::String(fd.name.clone()))
        .with(field::NUMBER, Value::Int(i64::from(fd.number)))
        .with(field::LABEL, Value::Enum(label))
        .with(field::TYPE, Value::Enum(bootstrap::type_id(&fd.kind)));
    if let FieldKind::Message(target) | FieldKind::Enum(target) = &fd.kind {
        v.set(field::TYPE_NAME, Value::String(format!(".{target}")));
    }
    if let Some(index) = fd.oneof {
        v.set(field::ONEOF_INDEX, Value::Int(index as i64));
    }
    let default_packed = syntax == Syntax::Proto3 && fd.kind.is_packable();
    if fd.cardinality == Cardinality::Repeated && fd.packed != default_packed {
        let options = MessageValue::new().with(field::PACKED, Value::Bool(fd.packed));
        v.set(field::OPTIONS, Value::Message(options));
    }
    v
}

fn enum_value(e: &EnumDescriptor) -> MessageValue {
    let values = e
        .values
        .iter()
        .map(|ev| {
            Value::Message(
                MessageValue::new()
                    .with(enumeration::VALUE_NAME, Value::String(ev.name.clone()))
                    .with(enumeration::VALUE_NUMBER, Value::Int(i64::from(ev.number))),
            )
        })
        .collect();
    MessageValue::new()
        .with(enumeration::NAME, Value::String(e.simple_name().to_string()))
        .with(enumeration::VALUE, Value::List(values))
}

fn string_at(msg: &MessageValue, number: u32) -> Option<&str> {
    msg.get(number).and_then(Value::as_str)
}

fn list_at(msg: &MessageValue, number: u32) -> &[Value] {
    msg.get(number).and_then(Value::as_list).unwrap_or(&[])
}

fn messages_at(msg: &MessageValue, number: u32) -> impl Iterator<Item = &MessageValue> {
    list_at(msg, number).iter().filter_map(Value::as_message)
}

fn message_at(msg: &MessageValue, number: u32) -> Option<&MessageValue> {
    msg.get(number).and_then(Value::as_message)
}

fn load_err(msg: String) -> ProtodynError {
    ProtodynError::SchemaLoad(msg)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::schema::pool::TypePool;

    fn sample_files() -> Vec<FileDescriptor> {
        vec![FileDescriptor {
            name: "t/sample.proto".into(),
            package: "t".into(),
            syntax: Syntax::Proto3,
            dependencies: vec![],
            messages: vec![
                MessageDescriptor::new(
                    "t.Outer",
                    vec![
                        FieldDescriptor::singular(1, "inner", FieldKind::Message("t.Outer.Inner".into())),
                        FieldDescriptor::map(2, "counts", "t.Outer.CountsEntry"),
                        FieldDescriptor::repeated(3, "ids", FieldKind::Sint32).with_packed(false),
                        FieldDescriptor::singular(4, "color", FieldKind::Enum("t.Outer.Color".into())),
                        FieldDescriptor::singular(5, "a", FieldKind::String).in_oneof(0),
                        FieldDescriptor::singular(6, "b", FieldKind::Int64).in_oneof(0),
                    ],
                )
                .with_oneofs(&["pick"]),
                MessageDescriptor::new(
                    "t.Outer.Inner",
                    vec![FieldDescriptor::repeated(1, "xs", FieldKind::Double)],
                ),
                MessageDescriptor::map_entry("t.Outer.CountsEntry", FieldKind::String, FieldKind::Uint64),
            ],
            enums: vec![EnumDescriptor::new("t.Outer.Color", &[("RED", 0), ("BLUE", 1)])],
        }]
    }

    #[test]
    fn export_then_parse_is_identity() {
        let files = sample_files();
        let bytes = encode(&files).unwrap();
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.len(), 1);
        let mut messages = parsed[0].messages.clone();
        messages.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        let mut expected = files[0].messages.clone();
        expected.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        assert_eq!(messages, expected);
        assert_eq!(parsed[0].enums, files[0].enums);
        TypePool::link(&parsed).unwrap();
    }

    #[test]
    fn relative_type_names_resolve_from_inner_scope() {
        let mut declared = HashMap::new();
        declared.insert("a.B".to_string(), Declared::Message { map_entry: false });
        declared.insert("a.M.B".to_string(), Declared::Enum);
        let (name, _) = resolve_reference("B", "a.M", &declared).unwrap();
        assert_eq!(name, "a.M.B");
        let (name, _) = resolve_reference("B", "a.Other", &declared).unwrap();
        assert_eq!(name, "a.B");
        let (name, _) = resolve_reference(".a.B", "a.M", &declared).unwrap();
        assert_eq!(name, "a.B");
        assert!(resolve_reference("C", "a.M", &declared).is_none());
    }

    #[test]
    fn group_fields_are_rejected() {
        let group = MessageValue::new()
            .with(field::NAME, Value::String("g".into()))
            .with(field::NUMBER, Value::Int(1))
            .with(field::TYPE, Value::Enum(field::TYPE_GROUP))
            .with(field::TYPE_NAME, Value::String(".G".into()));
        let m = MessageValue::new()
            .with(message::NAME, Value::String("M".into()))
            .with(message::FIELD, Value::List(vec![Value::Message(group)]));
        let f = MessageValue::new()
            .with(file::NAME, Value::String("g.proto".into()))
            .with(file::MESSAGE_TYPE, Value::List(vec![Value::Message(m)]));

        let pool = bootstrap::pool();
        let ty = MessageType::lookup(&pool, bootstrap::FILE_DESCRIPTOR_SET).unwrap();
        let bytes = codec::encode_message(
            &MessageValue::new().with(1, Value::List(vec![Value::Message(f)])),
            ty,
        )
        .unwrap();
        let err = parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("group"));
    }

    #[test]
    fn garbage_is_a_schema_load_error() {
        let err = parse(&[0xff, 0xff]).unwrap_err();
        assert_eq!(err.code().as_str(), "SCHEMA_LOAD");
    }
}
