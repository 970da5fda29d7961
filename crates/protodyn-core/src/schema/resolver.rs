//! Static and dynamic resolution behind one interface.

use crate::descriptor::{DescriptorPool, EnumDescriptor, MessageDescriptor, MessageType};
use crate::error::Result;
use crate::schema::catalog::{StaticCatalog, SAMPLE_PACKAGE};
use crate::schema::registry::Registry;

/// Expansion of simple type names into fully-qualified ones using the
/// template `<namespace>.<SimpleName>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    pub namespace: String,
}

impl Naming {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    /// Names that already contain a dot are taken as fully qualified.
    pub fn expand(&self, name: &str) -> String {
        if name.contains('.') || self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.namespace)
        }
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(SAMPLE_PACKAGE)
    }
}

#[derive(Debug, Clone)]
pub enum Resolver {
    /// Compiled-in sample shapes; never reads a descriptor set.
    Static(StaticCatalog),
    /// Descriptors loaded at runtime.
    Dynamic(Registry),
}

impl Resolver {
    pub fn resolve(&self, full_name: &str) -> Result<MessageType<'_>> {
        match self {
            Resolver::Static(catalog) => catalog.resolve(full_name),
            Resolver::Dynamic(registry) => registry.resolve(full_name),
        }
    }

    pub fn resolve_simple(&self, name: &str, naming: &Naming) -> Result<MessageType<'_>> {
        let full_name = naming.expand(name);
        tracing::debug!(name, %full_name, strategy = self.strategy(), "resolving message type");
        self.resolve(&full_name)
    }

    pub fn strategy(&self) -> &'static str {
        match self {
            Resolver::Static(_) => "static",
            Resolver::Dynamic(_) => "dynamic",
        }
    }
}

impl DescriptorPool for Resolver {
    fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        match self {
            Resolver::Static(catalog) => catalog.message(full_name),
            Resolver::Dynamic(registry) => registry.message(full_name),
        }
    }

    fn enumeration(&self, full_name: &str) -> Option<&EnumDescriptor> {
        match self {
            Resolver::Static(catalog) => catalog.enumeration(full_name),
            Resolver::Dynamic(registry) => registry.enumeration(full_name),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn both() -> [Resolver; 2] {
        let catalog = StaticCatalog::new();
        let registry = Registry::load(&catalog.file_descriptor_set().unwrap()).unwrap();
        [Resolver::Static(catalog), Resolver::Dynamic(registry)]
    }

    #[test]
    fn naming_template() {
        let naming = Naming::default();
        assert_eq!(naming.expand("SimpleMessage"), "protodyn.sample.SimpleMessage");
        assert_eq!(naming.expand("google.protobuf.Timestamp"), "google.protobuf.Timestamp");
        assert_eq!(Naming::new("x.y").expand("Z"), "x.y.Z");
    }

    #[test]
    fn strategies_agree_on_descriptors() {
        let [fixed, loaded] = both();
        let naming = Naming::default();
        for shape in StaticCatalog::shape_names() {
            let a = fixed.resolve_simple(shape, &naming).unwrap();
            let b = loaded.resolve_simple(shape, &naming).unwrap();
            assert_eq!(a.descriptor(), b.descriptor());
        }
    }

    #[test]
    fn missing_type_fails_in_both() {
        for resolver in both() {
            let err = resolver
                .resolve_simple("DoesNotExist", &Naming::default())
                .unwrap_err();
            assert_eq!(err.code().as_str(), "TYPE_NOT_FOUND", "{}", resolver.strategy());
        }
    }
}
