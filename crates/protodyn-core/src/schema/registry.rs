//! Runtime schema registry built from a serialized descriptor set.

use crate::descriptor::{
    DescriptorPool, EnumDescriptor, FileDescriptor, MessageDescriptor, MessageType,
};
use crate::error::{ProtodynError, Result};
use crate::schema::descriptor_set;
use crate::schema::pool::TypePool;

/// Immutable, fully linked set of descriptors.
#[derive(Debug, Clone)]
pub struct Registry {
    files: Vec<FileDescriptor>,
    pool: TypePool,
}

impl Registry {
    /// Load a serialized `FileDescriptorSet`.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let files = descriptor_set::parse(bytes)?;
        let registry = Self::from_files(files)?;
        tracing::debug!(
            files = registry.files.len(),
            bytes = bytes.len(),
            "descriptor set loaded"
        );
        Ok(registry)
    }

    pub fn from_files(files: Vec<FileDescriptor>) -> Result<Self> {
        let pool = TypePool::link(&files)?;
        Ok(Self { files, pool })
    }

    /// Exact, case-sensitive lookup of a message type.
    pub fn resolve(&self, full_name: &str) -> Result<MessageType<'_>> {
        if self.pool.message(full_name).is_none() && self.pool.enumeration(full_name).is_some() {
            return Err(ProtodynError::TypeNotFound(format!(
                "{full_name} is an enum, not a message"
            )));
        }
        MessageType::lookup(&self.pool, full_name)
    }

    pub fn resolve_enum(&self, full_name: &str) -> Result<&EnumDescriptor> {
        self.pool
            .enumeration(full_name)
            .ok_or_else(|| ProtodynError::TypeNotFound(full_name.to_string()))
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    /// Fully-qualified names of every message, sorted.
    pub fn message_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pool.message_names().collect();
        names.sort_unstable();
        names
    }

    /// Serialize the loaded files back into a descriptor set.
    pub fn to_descriptor_set(&self) -> Result<bytes::Bytes> {
        descriptor_set::encode(&self.files)
    }
}

impl DescriptorPool for Registry {
    fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.pool.message(full_name)
    }

    fn enumeration(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.pool.enumeration(full_name)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::descriptor::{FieldDescriptor, FieldKind, Syntax};

    fn registry() -> Registry {
        Registry::from_files(vec![FileDescriptor {
            name: "a.proto".into(),
            package: "a".into(),
            syntax: Syntax::Proto3,
            dependencies: vec![],
            messages: vec![MessageDescriptor::new(
                "a.Msg",
                vec![FieldDescriptor::singular(1, "kind", FieldKind::Enum("a.Kind".into()))],
            )],
            enums: vec![EnumDescriptor::new("a.Kind", &[("K0", 0)])],
        }])
        .unwrap()
    }

    #[test]
    fn resolves_messages_exactly() {
        let reg = registry();
        assert_eq!(reg.resolve("a.Msg").unwrap().full_name(), "a.Msg");
        let err = reg.resolve("a.msg").unwrap_err();
        assert_eq!(err.code().as_str(), "TYPE_NOT_FOUND");
    }

    #[test]
    fn enums_are_not_messages() {
        let reg = registry();
        let err = reg.resolve("a.Kind").unwrap_err();
        assert!(err.to_string().contains("not a message"));
        assert_eq!(reg.resolve_enum("a.Kind").unwrap().name_of(0), Some("K0"));
    }

    #[test]
    fn round_trips_through_bytes() {
        let reg = registry();
        let bytes = reg.to_descriptor_set().unwrap();
        let again = Registry::load(&bytes).unwrap();
        assert_eq!(again.message_names(), vec!["a.Msg"]);
        assert_eq!(
            again.resolve("a.Msg").unwrap().descriptor(),
            reg.resolve("a.Msg").unwrap().descriptor()
        );
    }
}
