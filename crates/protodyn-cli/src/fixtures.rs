//! Hand-written sample messages emitted by `protodyn emit`.

use bytes::Bytes;
use clap::ValueEnum;

use protodyn_core::codec::encode_static;
use protodyn_core::error::Result;
use protodyn_core::sample::{
    ComplexMessage, ComposedMessage, ImportMessage, Param03, SimpleMessage, SubMessage, Timestamp,
    Values,
};
use protodyn_core::schema::StaticCatalog;

/// Message shapes that can be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "verbatim")]
pub enum Shape {
    SimpleMessage,
    ComplexMessage,
    ComposedMessage,
    ImportMessage,
}

impl Shape {
    /// Simple message name, used as event type and schema fragment.
    pub fn name(self) -> &'static str {
        match self {
            Shape::SimpleMessage => "SimpleMessage",
            Shape::ComplexMessage => "ComplexMessage",
            Shape::ComposedMessage => "ComposedMessage",
            Shape::ImportMessage => "ImportMessage",
        }
    }

    /// Encode this shape's fixture with the compiled-in descriptors.
    pub fn encode(self, catalog: &StaticCatalog) -> Result<Bytes> {
        match self {
            Shape::SimpleMessage => encode_static(&simple_message(), catalog),
            Shape::ComplexMessage => encode_static(&complex_message(), catalog),
            Shape::ComposedMessage => encode_static(&composed_message(), catalog),
            Shape::ImportMessage => encode_static(&import_message(), catalog),
        }
    }
}

pub fn simple_message() -> SimpleMessage {
    SimpleMessage {
        param_01: "first parameter".into(),
        param_02: true,
        param_03: Bytes::from_static(&[0x00, 0x01, 0x02]),
        param_04: -32,
        param_05: -32321323412,
        param_06: 10,
        param_07: 2000000,
        param_08: 12,
        param_09: -391,
        param_10: 88888,
        param_11: 32412141431,
        param_12: 33224,
        param_13: -213123,
        param_14: -0.2,
        param_15: -0.000002,
    }
}

pub fn complex_message() -> ComplexMessage {
    ComplexMessage {
        param_01: vec!["one".into(), "two".into(), "three".into()],
        param_02: [
            ("autumn", "red"),
            ("winter", "blue"),
            ("spring", "green"),
            ("summer", "yellow"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
        param_03: Some(Param03::String("this is a oneof<string>".into())),
    }
}

pub fn import_message() -> ImportMessage {
    ImportMessage {
        param_01: Some(Timestamp::default()),
        param_02: Some(SubMessage {
            param_01: Values::Value1,
            param_02: "this is nested!".into(),
        }),
    }
}

pub fn composed_message() -> ComposedMessage {
    ComposedMessage {
        param_01: Some(simple_message()),
        param_02: Some(complex_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shape_encodes() {
        let catalog = StaticCatalog::new();
        for shape in Shape::value_variants() {
            let bytes = shape.encode(&catalog).unwrap();
            assert!(!bytes.is_empty(), "{}", shape.name());
        }
    }

    #[test]
    fn shape_names_match_catalog() {
        let names: Vec<_> = Shape::value_variants().iter().map(|s| s.name()).collect();
        for name in StaticCatalog::shape_names() {
            assert!(names.contains(name), "{name}");
        }
    }

    #[test]
    fn shapes_parse_verbatim() {
        assert_eq!(
            Shape::from_str("ImportMessage", false).unwrap(),
            Shape::ImportMessage
        );
        assert!(Shape::from_str("import-message", false).is_err());
    }
}
