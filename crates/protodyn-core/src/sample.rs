//! Fixed-shape sample messages matching the static catalog.

use bytes::Bytes;

use crate::schema::catalog::{
    StaticMessage, COMPLEX_MESSAGE, COMPOSED_MESSAGE, IMPORT_MESSAGE, SIMPLE_MESSAGE, SUB_MESSAGE,
    TIMESTAMP,
};
use crate::value::{MessageValue, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl StaticMessage for Timestamp {
    const NAME: &'static str = TIMESTAMP;

    fn to_value(&self) -> MessageValue {
        MessageValue::new()
            .with(1, Value::Int(self.seconds))
            .with(2, Value::Int(i64::from(self.nanos)))
    }
}

/// One field of every scalar kind, numbered 1 to 15.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleMessage {
    pub param_01: String,
    pub param_02: bool,
    pub param_03: Bytes,
    pub param_04: i32,
    pub param_05: i64,
    pub param_06: u32,
    pub param_07: u64,
    /// sint32
    pub param_08: i32,
    /// sint64
    pub param_09: i64,
    /// fixed32
    pub param_10: u32,
    /// fixed64
    pub param_11: u64,
    /// sfixed32
    pub param_12: i32,
    /// sfixed64
    pub param_13: i64,
    pub param_14: f32,
    pub param_15: f64,
}

impl StaticMessage for SimpleMessage {
    const NAME: &'static str = SIMPLE_MESSAGE;

    fn to_value(&self) -> MessageValue {
        MessageValue::new()
            .with(1, Value::String(self.param_01.clone()))
            .with(2, Value::Bool(self.param_02))
            .with(3, Value::Bytes(self.param_03.clone()))
            .with(4, Value::Int(i64::from(self.param_04)))
            .with(5, Value::Int(self.param_05))
            .with(6, Value::UInt(u64::from(self.param_06)))
            .with(7, Value::UInt(self.param_07))
            .with(8, Value::Int(i64::from(self.param_08)))
            .with(9, Value::Int(self.param_09))
            .with(10, Value::UInt(u64::from(self.param_10)))
            .with(11, Value::UInt(self.param_11))
            .with(12, Value::Int(i64::from(self.param_12)))
            .with(13, Value::Int(self.param_13))
            .with(14, Value::Float(f64::from(self.param_14)))
            .with(15, Value::Float(self.param_15))
    }
}

/// The `param_03` oneof of [`ComplexMessage`].
#[derive(Debug, Clone, PartialEq)]
pub enum Param03 {
    String(String),
    Int(i32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexMessage {
    pub param_01: Vec<String>,
    /// Map entries in insertion order.
    pub param_02: Vec<(String, String)>,
    pub param_03: Option<Param03>,
}

impl StaticMessage for ComplexMessage {
    const NAME: &'static str = COMPLEX_MESSAGE;

    fn to_value(&self) -> MessageValue {
        let list = self.param_01.iter().cloned().map(Value::String).collect();
        let map = self
            .param_02
            .iter()
            .map(|(k, v)| (Value::String(k.clone()), Value::String(v.clone())))
            .collect();
        let msg = MessageValue::new()
            .with(1, Value::List(list))
            .with(2, Value::Map(map));
        match &self.param_03 {
            Some(Param03::String(s)) => msg.with(3, Value::String(s.clone())),
            Some(Param03::Int(i)) => msg.with(4, Value::Int(i64::from(*i))),
            None => msg,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum Values {
    #[default]
    Value0 = 0,
    Value1 = 1,
    Value2 = 2,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubMessage {
    pub param_01: Values,
    pub param_02: String,
}

impl StaticMessage for SubMessage {
    const NAME: &'static str = SUB_MESSAGE;

    fn to_value(&self) -> MessageValue {
        MessageValue::new()
            .with(1, Value::Enum(self.param_01 as i32))
            .with(2, Value::String(self.param_02.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportMessage {
    pub param_01: Option<Timestamp>,
    pub param_02: Option<SubMessage>,
}

impl StaticMessage for ImportMessage {
    const NAME: &'static str = IMPORT_MESSAGE;

    fn to_value(&self) -> MessageValue {
        let mut msg = MessageValue::new();
        if let Some(ts) = &self.param_01 {
            msg.set(1, Value::Message(ts.to_value()));
        }
        if let Some(sub) = &self.param_02 {
            msg.set(2, Value::Message(sub.to_value()));
        }
        msg
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposedMessage {
    pub param_01: Option<SimpleMessage>,
    pub param_02: Option<ComplexMessage>,
}

impl StaticMessage for ComposedMessage {
    const NAME: &'static str = COMPOSED_MESSAGE;

    fn to_value(&self) -> MessageValue {
        let mut msg = MessageValue::new();
        if let Some(simple) = &self.param_01 {
            msg.set(1, Value::Message(simple.to_value()));
        }
        if let Some(complex) = &self.param_02 {
            msg.set(2, Value::Message(complex.to_value()));
        }
        msg
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::codec::{decode, encode_static};
    use crate::schema::catalog::StaticCatalog;

    #[test]
    fn static_shape_decodes_with_catalog_descriptor() {
        let catalog = StaticCatalog::new();
        let msg = ImportMessage {
            param_01: Some(Timestamp::default()),
            param_02: Some(SubMessage {
                param_01: Values::Value1,
                param_02: "this is nested!".into(),
            }),
        };
        let bytes = encode_static(&msg, &catalog).unwrap();
        let ty = catalog.resolve(IMPORT_MESSAGE).unwrap();
        let decoded = decode(&bytes, ty).unwrap();
        let decoded = decoded.as_message().unwrap();
        // zero-valued timestamp fields are not on the wire
        assert_eq!(decoded.get(1), Some(&Value::Message(MessageValue::new())));
        assert_eq!(
            decoded.get(2),
            msg.to_value().get(2),
        );
    }

    #[test]
    fn oneof_variant_selects_field() {
        let msg = ComplexMessage {
            param_03: Some(Param03::Int(7)),
            ..Default::default()
        };
        let v = msg.to_value();
        assert!(!v.contains(3));
        assert_eq!(v.get(4), Some(&Value::Int(7)));
    }
}
