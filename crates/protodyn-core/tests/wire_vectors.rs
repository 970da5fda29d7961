//! Wire-format vector tests: decode against the compiled-in catalog and the
//! same catalog loaded back from its exported descriptor set.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use protodyn_core::codec::{decode, encode};
use protodyn_core::json::to_json;
use protodyn_core::schema::{Naming, Registry, Resolver, StaticCatalog};

use vector_loader::load;

const FILES: [&str; 9] = [
    "simple_first_params.json",
    "simple_all_kinds.json",
    "complex_map_last_write.json",
    "unknown_field_skipped.json",
    "import_nested_enum.json",
    "truncated_varint.json",
    "reserved_wire_type.json",
    "invalid_utf8.json",
    "length_overflow.json",
];

fn resolvers() -> [Resolver; 2] {
    let catalog = StaticCatalog::new();
    let registry = Registry::load(&catalog.file_descriptor_set().unwrap()).unwrap();
    [Resolver::Static(catalog), Resolver::Dynamic(registry)]
}

#[test]
fn wire_vectors() {
    let naming = Naming::default();
    for resolver in resolvers() {
        for f in FILES {
            let v = load(f);
            let raw = v.frame.decode();
            let ty = resolver.resolve_simple(&v.message, &naming).unwrap();
            let res = decode(&raw, ty);

            if let Some(err) = v.expect_error {
                let e = res.expect_err("expected error");
                assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
                continue;
            }

            let value = res.expect("expected decoded message");
            let ex = v.expect.expect("missing expect block");
            assert_eq!(to_json(&value, ty).unwrap(), ex, "vector={}", v.description);

            // re-encoding is stable
            let again = encode(&value, ty).unwrap();
            assert_eq!(decode(&again, ty).unwrap(), value, "vector={}", v.description);
        }
    }
}

#[test]
fn first_parameter_bytes_are_canonical() {
    let v = load("simple_first_params.json");
    let raw = v.frame.decode();
    let catalog = StaticCatalog::new();
    let ty = catalog.resolve("protodyn.sample.SimpleMessage").unwrap();
    let value = decode(&raw, ty).unwrap();
    assert_eq!(encode(&value, ty).unwrap().to_vec(), raw);
}
