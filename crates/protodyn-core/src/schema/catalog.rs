//! Compiled-in descriptors for the sample shapes.
//!
//! The static catalog answers the same lookups as a loaded [`Registry`]
//! without reading a descriptor set; it can also export itself as one.
//!
//! [`Registry`]: crate::schema::Registry

use bytes::Bytes;

use crate::descriptor::{
    DescriptorPool, EnumDescriptor, FieldDescriptor, FieldKind, FileDescriptor, MessageDescriptor,
    MessageType, Syntax,
};
use crate::error::Result;
use crate::schema::descriptor_set;
use crate::schema::pool::TypePool;
use crate::value::MessageValue;

/// Package of the sample shapes.
pub const SAMPLE_PACKAGE: &str = "protodyn.sample";

pub const TIMESTAMP: &str = "google.protobuf.Timestamp";
pub const SIMPLE_MESSAGE: &str = "protodyn.sample.SimpleMessage";
pub const COMPLEX_MESSAGE: &str = "protodyn.sample.ComplexMessage";
pub const COMPLEX_PARAM_02_ENTRY: &str = "protodyn.sample.ComplexMessage.Param02Entry";
pub const VALUES: &str = "protodyn.sample.Values";
pub const SUB_MESSAGE: &str = "protodyn.sample.SubMessage";
pub const IMPORT_MESSAGE: &str = "protodyn.sample.ImportMessage";
pub const COMPOSED_MESSAGE: &str = "protodyn.sample.ComposedMessage";

const TIMESTAMP_FILE: &str = "google/protobuf/timestamp.proto";
const SIMPLE_FILE: &str = "protodyn/sample/simple.proto";
const NESTED_FILE: &str = "protodyn/sample/nested.proto";
const COMPOSITE_FILE: &str = "protodyn/sample/composite.proto";

/// A compiled-in message shape that knows its descriptor name and how to
/// become a generic value.
pub trait StaticMessage {
    /// Fully-qualified message name.
    const NAME: &'static str;

    fn to_value(&self) -> MessageValue;
}

#[derive(Debug, Clone)]
pub struct StaticCatalog {
    files: Vec<FileDescriptor>,
    pool: TypePool,
}

impl StaticCatalog {
    pub fn new() -> Self {
        let files = sample_files();
        let pool = TypePool::index(&files);
        Self { files, pool }
    }

    pub fn resolve(&self, full_name: &str) -> Result<MessageType<'_>> {
        MessageType::lookup(&self.pool, full_name)
    }

    /// Simple names of the top-level sample shapes.
    pub fn shape_names() -> &'static [&'static str] {
        &["SimpleMessage", "ComplexMessage", "ImportMessage", "ComposedMessage"]
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    /// The catalog as a serialized `FileDescriptorSet`, loadable by
    /// `Registry::load`.
    pub fn file_descriptor_set(&self) -> Result<Bytes> {
        descriptor_set::encode(&self.files)
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorPool for StaticCatalog {
    fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.pool.message(full_name)
    }

    fn enumeration(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.pool.enumeration(full_name)
    }
}

fn msg(name: &str) -> FieldKind {
    FieldKind::Message(name.to_string())
}

fn sample_files() -> Vec<FileDescriptor> {
    use FieldDescriptor as F;

    let timestamp = FileDescriptor {
        name: TIMESTAMP_FILE.into(),
        package: "google.protobuf".into(),
        syntax: Syntax::Proto3,
        dependencies: vec![],
        messages: vec![MessageDescriptor::new(
            TIMESTAMP,
            vec![
                F::singular(1, "seconds", FieldKind::Int64),
                F::singular(2, "nanos", FieldKind::Int32),
            ],
        )],
        enums: vec![],
    };

    let simple = FileDescriptor {
        name: SIMPLE_FILE.into(),
        package: SAMPLE_PACKAGE.into(),
        syntax: Syntax::Proto3,
        dependencies: vec![],
        messages: vec![
            MessageDescriptor::new(
                SIMPLE_MESSAGE,
                vec![
                    F::singular(1, "param_01", FieldKind::String),
                    F::singular(2, "param_02", FieldKind::Bool),
                    F::singular(3, "param_03", FieldKind::Bytes),
                    F::singular(4, "param_04", FieldKind::Int32),
                    F::singular(5, "param_05", FieldKind::Int64),
                    F::singular(6, "param_06", FieldKind::Uint32),
                    F::singular(7, "param_07", FieldKind::Uint64),
                    F::singular(8, "param_08", FieldKind::Sint32),
                    F::singular(9, "param_09", FieldKind::Sint64),
                    F::singular(10, "param_10", FieldKind::Fixed32),
                    F::singular(11, "param_11", FieldKind::Fixed64),
                    F::singular(12, "param_12", FieldKind::Sfixed32),
                    F::singular(13, "param_13", FieldKind::Sfixed64),
                    F::singular(14, "param_14", FieldKind::Float),
                    F::singular(15, "param_15", FieldKind::Double),
                ],
            ),
            MessageDescriptor::new(
                COMPLEX_MESSAGE,
                vec![
                    F::repeated(1, "param_01", FieldKind::String),
                    F::map(2, "param_02", COMPLEX_PARAM_02_ENTRY),
                    F::singular(3, "param_03_string", FieldKind::String).in_oneof(0),
                    F::singular(4, "param_03_int", FieldKind::Int32).in_oneof(0),
                ],
            )
            .with_oneofs(&["param_03"]),
            MessageDescriptor::map_entry(
                COMPLEX_PARAM_02_ENTRY,
                FieldKind::String,
                FieldKind::String,
            ),
        ],
        enums: vec![],
    };

    let nested = FileDescriptor {
        name: NESTED_FILE.into(),
        package: SAMPLE_PACKAGE.into(),
        syntax: Syntax::Proto3,
        dependencies: vec![],
        messages: vec![MessageDescriptor::new(
            SUB_MESSAGE,
            vec![
                F::singular(1, "param_01", FieldKind::Enum(VALUES.to_string())),
                F::singular(2, "param_02", FieldKind::String),
            ],
        )],
        enums: vec![EnumDescriptor::new(
            VALUES,
            &[("VALUE_0", 0), ("VALUE_1", 1), ("VALUE_2", 2)],
        )],
    };

    let composite = FileDescriptor {
        name: COMPOSITE_FILE.into(),
        package: SAMPLE_PACKAGE.into(),
        syntax: Syntax::Proto3,
        dependencies: vec![
            TIMESTAMP_FILE.into(),
            NESTED_FILE.into(),
            SIMPLE_FILE.into(),
        ],
        messages: vec![
            MessageDescriptor::new(
                IMPORT_MESSAGE,
                vec![
                    F::singular(1, "param_01", msg(TIMESTAMP)),
                    F::singular(2, "param_02", msg(SUB_MESSAGE)),
                ],
            ),
            MessageDescriptor::new(
                COMPOSED_MESSAGE,
                vec![
                    F::singular(1, "param_01", msg(SIMPLE_MESSAGE)),
                    F::singular(2, "param_02", msg(COMPLEX_MESSAGE)),
                ],
            ),
        ],
        enums: vec![],
    };

    vec![timestamp, simple, nested, composite]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::schema::Registry;

    #[test]
    fn catalog_is_self_contained() {
        let catalog = StaticCatalog::new();
        TypePool::link(catalog.files()).unwrap();
        for shape in StaticCatalog::shape_names() {
            let fqn = format!("{SAMPLE_PACKAGE}.{shape}");
            assert!(catalog.resolve(&fqn).is_ok(), "{fqn}");
        }
    }

    #[test]
    fn exported_set_loads_as_registry() {
        let catalog = StaticCatalog::new();
        let registry = Registry::load(&catalog.file_descriptor_set().unwrap()).unwrap();
        for name in [SIMPLE_MESSAGE, COMPLEX_MESSAGE, COMPLEX_PARAM_02_ENTRY, SUB_MESSAGE] {
            assert_eq!(
                registry.resolve(name).unwrap().descriptor(),
                catalog.resolve(name).unwrap().descriptor(),
                "{name}"
            );
        }
        assert_eq!(registry.files().len(), 4);
    }

    #[test]
    fn unknown_shape_is_type_not_found() {
        let err = StaticCatalog::new()
            .resolve("protodyn.sample.DoesNotExist")
            .unwrap_err();
        assert_eq!(err.code().as_str(), "TYPE_NOT_FOUND");
    }
}
