//! Name-indexed descriptor storage and cross-file linking.

use std::collections::{HashMap, HashSet};

use crate::descriptor::{
    Cardinality, DescriptorPool, EnumDescriptor, FieldKind, FileDescriptor, MessageDescriptor,
};
use crate::error::{ProtodynError, Result};
use crate::protocol::wire::MAX_FIELD_NUMBER;

#[derive(Debug, Clone, Default)]
pub struct TypePool {
    messages: HashMap<String, MessageDescriptor>,
    enums: HashMap<String, EnumDescriptor>,
}

impl TypePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, descriptor: MessageDescriptor) {
        self.messages.insert(descriptor.full_name.clone(), descriptor);
    }

    pub fn add_enum(&mut self, descriptor: EnumDescriptor) {
        self.enums.insert(descriptor.full_name.clone(), descriptor);
    }

    /// Index declarations without validating references.
    pub fn index(files: &[FileDescriptor]) -> Self {
        let mut pool = Self::new();
        for file in files {
            for m in &file.messages {
                pool.add_message(m.clone());
            }
            for e in &file.enums {
                pool.add_enum(e.clone());
            }
        }
        pool
    }

    /// Index declarations and check that the set is self-contained:
    /// unique names, satisfied imports, resolvable references, well-formed
    /// fields and map entries.
    pub fn link(files: &[FileDescriptor]) -> Result<Self> {
        let file_names: HashSet<&str> = files.iter().map(|f| f.name.as_str()).collect();
        if file_names.len() != files.len() {
            return Err(load_err("duplicate file name in descriptor set".into()));
        }

        let mut seen = HashSet::new();
        for file in files {
            for dep in &file.dependencies {
                if !file_names.contains(dep.as_str()) {
                    return Err(load_err(format!(
                        "{} imports {dep}, which is not part of the descriptor set",
                        file.name
                    )));
                }
            }
            let names = file
                .messages
                .iter()
                .map(|m| &m.full_name)
                .chain(file.enums.iter().map(|e| &e.full_name));
            for name in names {
                if !seen.insert(name.as_str()) {
                    return Err(load_err(format!("duplicate type name {name}")));
                }
            }
        }

        let pool = Self::index(files);
        for file in files {
            for message in &file.messages {
                pool.check_message(message)?;
            }
        }
        Ok(pool)
    }

    fn check_message(&self, message: &MessageDescriptor) -> Result<()> {
        let mut numbers = HashSet::new();
        for field in &message.fields {
            let at = || format!("{}.{}", message.full_name, field.name);
            if field.number == 0 || field.number > MAX_FIELD_NUMBER {
                return Err(load_err(format!("{}: invalid field number {}", at(), field.number)));
            }
            if !numbers.insert(field.number) {
                return Err(load_err(format!("{}: duplicate field number {}", at(), field.number)));
            }
            if let Some(index) = field.oneof {
                if index >= message.oneofs.len() {
                    return Err(load_err(format!("{}: oneof index {index} out of range", at())));
                }
            }
            match &field.kind {
                FieldKind::Message(name) => {
                    let target = self.messages.get(name).ok_or_else(|| {
                        load_err(format!("{}: unknown message type {name}", at()))
                    })?;
                    if field.cardinality == Cardinality::Map {
                        check_map_entry(target)?;
                    }
                }
                FieldKind::Enum(name) => {
                    if !self.enums.contains_key(name) {
                        return Err(load_err(format!("{}: unknown enum type {name}", at())));
                    }
                }
                _ if field.cardinality == Cardinality::Map => {
                    return Err(load_err(format!("{}: map field without entry type", at())));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }
}

fn check_map_entry(entry: &MessageDescriptor) -> Result<()> {
    let key = entry.field(1);
    let value = entry.field(2);
    match (key, value) {
        (Some(k), Some(v))
            if entry.map_entry
                && k.kind.is_map_key()
                && k.cardinality == Cardinality::Singular
                && v.cardinality == Cardinality::Singular => Ok(()),
        _ => Err(load_err(format!(
            "{} is not a valid map entry (needs scalar key = 1 and value = 2)",
            entry.full_name
        ))),
    }
}

fn load_err(msg: String) -> ProtodynError {
    ProtodynError::SchemaLoad(msg)
}

impl DescriptorPool for TypePool {
    fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name)
    }

    fn enumeration(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(full_name)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::descriptor::{FieldDescriptor, Syntax};

    fn file(name: &str, deps: &[&str], messages: Vec<MessageDescriptor>) -> FileDescriptor {
        FileDescriptor {
            name: name.into(),
            package: "t".into(),
            syntax: Syntax::Proto3,
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            messages,
            enums: Vec::new(),
        }
    }

    #[test]
    fn missing_import_fails() {
        let files = [file("a.proto", &["b.proto"], vec![])];
        let err = TypePool::link(&files).unwrap_err();
        assert_eq!(err.code().as_str(), "SCHEMA_LOAD");
        assert!(err.to_string().contains("b.proto"));
    }

    #[test]
    fn unresolved_reference_fails() {
        let m = MessageDescriptor::new(
            "t.A",
            vec![FieldDescriptor::singular(1, "b", FieldKind::Message("t.B".into()))],
        );
        let err = TypePool::link(&[file("a.proto", &[], vec![m])]).unwrap_err();
        assert!(err.to_string().contains("unknown message type t.B"));
    }

    #[test]
    fn duplicate_names_fail() {
        let a = MessageDescriptor::new("t.A", vec![]);
        let files = [
            file("a.proto", &[], vec![a.clone()]),
            file("b.proto", &[], vec![a]),
        ];
        assert!(TypePool::link(&files).is_err());
    }

    #[test]
    fn cross_file_reference_links() {
        let b = MessageDescriptor::new("t.B", vec![]);
        let a = MessageDescriptor::new(
            "t.A",
            vec![FieldDescriptor::singular(1, "b", FieldKind::Message("t.B".into()))],
        );
        let files = [
            file("b.proto", &[], vec![b]),
            file("a.proto", &["b.proto"], vec![a]),
        ];
        let pool = TypePool::link(&files).unwrap();
        assert!(pool.message("t.A").is_some());
        assert!(pool.message("t.B").is_some());
    }

    #[test]
    fn map_must_point_at_entry() {
        let not_entry = MessageDescriptor::new("t.E", vec![]);
        let a = MessageDescriptor::new("t.A", vec![FieldDescriptor::map(1, "m", "t.E")]);
        assert!(TypePool::link(&[file("a.proto", &[], vec![a, not_entry])]).is_err());
    }
}
