//! Top-level facade crate for protodyn.
//!
//! Re-exports the core codec library and the CLI library so users can depend
//! on a single crate.

pub mod core {
    pub use protodyn_core::*;
}

pub mod cli {
    pub use protodyn_cli::*;
}

#[cfg(test)]
mod tests {
    use super::cli::fixtures::Shape;
    use super::core::{Naming, Resolver, StaticCatalog};

    #[test]
    fn facade_reaches_both_crates() {
        let resolver = Resolver::Static(StaticCatalog::new());
        let ty = resolver
            .resolve_simple(Shape::ComposedMessage.name(), &Naming::default())
            .unwrap();
        assert_eq!(ty.full_name(), "protodyn.sample.ComposedMessage");
    }
}
