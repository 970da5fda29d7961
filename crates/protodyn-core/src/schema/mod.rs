//! Schema sources: runtime registry, compiled-in catalog, and the resolver
//! that selects between them.

pub mod bootstrap;
pub mod catalog;
pub mod descriptor_set;
pub mod pool;
pub mod reference;
pub mod registry;
pub mod resolver;

pub use catalog::{StaticCatalog, StaticMessage};
pub use reference::SchemaRef;
pub use registry::Registry;
pub use resolver::{Naming, Resolver};
