//! Envelope record tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::PathBuf;

use protodyn_core::codec::decode;
use protodyn_core::json::to_json;
use protodyn_core::protocol::envelope::{self, Envelope};
use protodyn_core::schema::{Naming, Resolver, SchemaRef, StaticCatalog};
use serde_json::json;

use vector_loader::load_raw;

#[test]
fn wrapped_record_opens_and_projects() {
    let raw = load_raw("envelope_wrapped.json");
    let (payload, schema) = envelope::unwrap(raw.as_bytes()).unwrap();
    assert_eq!(schema, "file:///schema.pb#SimpleMessage");

    let reference = SchemaRef::parse(&schema).unwrap();
    assert_eq!(reference.location, PathBuf::from("/schema.pb"));

    let resolver = Resolver::Static(StaticCatalog::new());
    let ty = resolver
        .resolve_simple(&reference.type_name, &Naming::default())
        .unwrap();
    let projected = to_json(&decode(&payload, ty).unwrap(), ty).unwrap();
    assert_eq!(
        projected,
        json!({"param_01": "first parameter", "param_02": true, "param_03": "AAEC"})
    );

    let out = Envelope::from_slice(raw.as_bytes())
        .unwrap()
        .into_projected(projected.clone());
    assert_eq!(out.datacontenttype.as_deref(), Some("application/json"));
    assert_eq!(out.data, Some(projected));
    assert_eq!(out.event_type, "SimpleMessage");
}

#[test]
fn data_base64_record_keeps_extensions() {
    let raw = load_raw("envelope_data_base64.json");
    let env = Envelope::from_slice(raw.as_bytes()).unwrap();
    assert_eq!(env.payload().unwrap().len(), 24);
    assert!(env.extensions.contains_key("traceparent"));

    let reference = SchemaRef::parse(env.schema_ref().unwrap()).unwrap();
    assert_eq!(reference.location, PathBuf::from("schemas/events.pb"));
}

#[test]
fn record_without_schema_is_rejected() {
    let raw = load_raw("envelope_missing_schema.json");
    let err = envelope::unwrap(raw.as_bytes()).unwrap_err();
    assert_eq!(err.code().as_str(), "ENVELOPE_FORMAT");
}

#[test]
fn unknown_type_is_type_not_found() {
    let raw = load_raw("envelope_unknown_type.json");
    let (_, schema) = envelope::unwrap(raw.as_bytes()).unwrap();
    let reference = SchemaRef::parse(&schema).unwrap();
    let resolver = Resolver::Static(StaticCatalog::new());
    let err = resolver
        .resolve_simple(&reference.type_name, &Naming::default())
        .unwrap_err();
    assert_eq!(err.code().as_str(), "TYPE_NOT_FOUND");
}

#[test]
fn wrap_round_trips_through_bytes() {
    let env = envelope::wrap(b"\x08\x01", "SimpleMessage", "file:///schema.pb");
    let bytes = env.to_vec().unwrap();
    let back = Envelope::from_slice(&bytes).unwrap();
    assert_eq!(back, env);
}
