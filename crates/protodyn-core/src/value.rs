//! Generic value tree produced by the decoder and consumed by the encoder.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

use crate::descriptor::{FieldKind, MessageDescriptor};

#[derive(Debug, Clone)]
pub enum Value {
    Absent,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Bytes),
    /// Enum number; symbols are looked up on projection.
    Enum(i32),
    Message(MessageValue),
    List(Vec<Value>),
    /// Entries in insertion order, keys unique.
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Absent => "absent",
            Value::Bool(_) => "bool",
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Scalar zero values, which the encoder omits for singular fields.
    /// Messages are never default: presence of a sub-message is significant.
    pub fn is_default(&self) -> bool {
        match self {
            Value::Absent => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::UInt(u) => *u == 0,
            Value::Float(f) => f.to_bits() == 0,
            Value::String(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::Enum(n) => *n == 0,
            Value::Message(_) => false,
            Value::List(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<i32> {
        match self {
            Value::Enum(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageValue> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

// Floats compare by bit pattern (any NaN equals any NaN) so that decoded
// values compare equal to the values they were encoded from.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Absent, Value::Absent) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Message(a), Value::Message(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<MessageValue> for Value {
    fn from(msg: MessageValue) -> Self {
        Value::Message(msg)
    }
}

/// Field-number-ordered set of field values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageValue {
    fields: BTreeMap<u32, Value>,
}

impl MessageValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, number: u32, value: Value) -> Self {
        self.fields.insert(number, value);
        self
    }

    pub fn get(&self, number: u32) -> Option<&Value> {
        self.fields.get(&number)
    }

    pub fn get_mut(&mut self, number: u32) -> Option<&mut Value> {
        self.fields.get_mut(&number)
    }

    /// Look a field up by its declared name.
    pub fn get_by_name(&self, descriptor: &MessageDescriptor, name: &str) -> Option<&Value> {
        descriptor
            .field_by_name(name)
            .and_then(|f| self.fields.get(&f.number))
    }

    pub fn set(&mut self, number: u32, value: Value) -> Option<Value> {
        self.fields.insert(number, value)
    }

    pub fn remove(&mut self, number: u32) -> Option<Value> {
        self.fields.remove(&number)
    }

    pub fn contains(&self, number: u32) -> bool {
        self.fields
            .get(&number)
            .is_some_and(|v| !matches!(v, Value::Absent))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Value)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.fields.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Append to the list stored at `number`, creating it on first use.
    pub fn push(&mut self, number: u32, value: Value) {
        match self.fields.get_mut(&number) {
            Some(Value::List(items)) => items.push(value),
            _ => {
                self.fields.insert(number, Value::List(vec![value]));
            }
        }
    }
}

impl IntoIterator for MessageValue {
    type Item = (u32, Value);
    type IntoIter = std::collections::btree_map::IntoIter<u32, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl FromIterator<(u32, Value)> for MessageValue {
    fn from_iter<I: IntoIterator<Item = (u32, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Zero value of a kind, used for map entries that omit their key or value.
pub fn default_value(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Double | FieldKind::Float => Value::Float(0.0),
        FieldKind::Int32
        | FieldKind::Int64
        | FieldKind::Sint32
        | FieldKind::Sint64
        | FieldKind::Sfixed32
        | FieldKind::Sfixed64 => Value::Int(0),
        FieldKind::Uint32 | FieldKind::Uint64 | FieldKind::Fixed32 | FieldKind::Fixed64 => {
            Value::UInt(0)
        }
        FieldKind::Bool => Value::Bool(false),
        FieldKind::String => Value::String(String::new()),
        FieldKind::Bytes => Value::Bytes(Bytes::new()),
        FieldKind::Enum(_) => Value::Enum(0),
        FieldKind::Message(_) => Value::Message(MessageValue::new()),
    }
}

/// Hashable form of the scalar kinds protobuf allows as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    UInt(u64),
    String(String),
}

impl MapKey {
    /// `None` for values that cannot be map keys.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(MapKey::Bool(*b)),
            Value::Int(i) => Some(MapKey::Int(*i)),
            Value::UInt(u) => Some(MapKey::UInt(*u)),
            Value::String(s) => Some(MapKey::String(s.clone())),
            _ => None,
        }
    }
}

/// Ordered map entries with a key index, for last-write-wins inserts in
/// constant time. An overwritten key keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct MapBuilder {
    entries: Vec<(Value, Value)>,
    index: HashMap<MapKey, usize>,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing entries; later duplicates overwrite earlier ones.
    pub fn from_entries(entries: Vec<(Value, Value)>) -> Self {
        let mut map = Self {
            entries: Vec::with_capacity(entries.len()),
            index: HashMap::with_capacity(entries.len()),
        };
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }

    /// Returns `true` when `key` was already present.
    pub fn insert(&mut self, key: Value, value: Value) -> bool {
        let Some(hashed) = MapKey::of(&key) else {
            // not a valid key kind; kept so the encoder reports it
            if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
                entry.1 = value;
                return true;
            }
            self.entries.push((key, value));
            return false;
        };
        match self.index.get(&hashed) {
            Some(&at) => {
                if let Some(entry) = self.entries.get_mut(at) {
                    entry.1 = value;
                }
                true
            }
            None => {
                self.index.insert(hashed, self.entries.len());
                self.entries.push((key, value));
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<(Value, Value)> {
        self.entries
    }
}
