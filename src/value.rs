//! The bound value tree.
//!
//! Every document is bound into a `Value` first; typed targets are then extracted
//! through serde (see `value_de`). Containers remember the element shapes they were
//! bound with, which is how generic tightening is observable: a generic `[1, 2, 3]`
//! comes out as a sequence of `i64`, `[1, "x"]` stays a sequence of `any`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHashMap;

use crate::shape::Shape;
use crate::type_cache::RecordInfo;

/// A number, tagged with the precision it was bound at.
#[derive(Clone, Copy, Debug)]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Number {
    pub fn shape(&self) -> Shape {
        match self {
            Number::I8(_) => Shape::I8,
            Number::I16(_) => Shape::I16,
            Number::I32(_) => Shape::I32,
            Number::I64(_) => Shape::I64,
            Number::U8(_) => Shape::U8,
            Number::U16(_) => Shape::U16,
            Number::U32(_) => Shape::U32,
            Number::U64(_) => Shape::U64,
            Number::F32(_) => Shape::F32,
            Number::F64(_) => Shape::F64,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::I8(v) => Some(v.into()),
            Number::I16(v) => Some(v.into()),
            Number::I32(v) => Some(v.into()),
            Number::I64(v) => Some(v),
            Number::U8(v) => Some(v.into()),
            Number::U16(v) => Some(v.into()),
            Number::U32(v) => Some(v.into()),
            Number::U64(v) => i64::try_from(v).ok(),
            Number::F32(_) | Number::F64(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Number::U8(v) => Some(v.into()),
            Number::U16(v) => Some(v.into()),
            Number::U32(v) => Some(v.into()),
            Number::U64(v) => Some(v),
            Number::F32(_) | Number::F64(_) => None,
            _ => self.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::F32(v) => v.into(),
            Number::F64(v) => v,
            Number::U64(v) => v as f64,
            _ => self.as_i64().map(|v| v as f64).unwrap_or_default(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            Number::F32(v) => v == 0.0,
            Number::F64(v) => v == 0.0,
            Number::U64(v) => v == 0,
            _ => self.as_i64() == Some(0),
        }
    }

    // Floats compare by bit pattern so that numbers can key a map.
    fn bits(&self) -> u64 {
        match *self {
            Number::I8(v) => v as u64,
            Number::I16(v) => v as u64,
            Number::I32(v) => v as u64,
            Number::I64(v) => v as u64,
            Number::U8(v) => v.into(),
            Number::U16(v) => v.into(),
            Number::U32(v) => v.into(),
            Number::U64(v) => v,
            Number::F32(v) => v.to_bits().into(),
            Number::F64(v) => v.to_bits(),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other) && self.bits() == other.bits()
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        self.bits().hash(state);
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::I8(v) => write!(f, "{v}"),
            Number::I16(v) => write!(f, "{v}"),
            Number::I32(v) => write!(f, "{v}"),
            Number::I64(v) => write!(f, "{v}"),
            Number::U8(v) => write!(f, "{v}"),
            Number::U16(v) => write!(f, "{v}"),
            Number::U32(v) => write!(f, "{v}"),
            Number::U64(v) => write!(f, "{v}"),
            Number::F32(v) => write!(f, "{v}"),
            Number::F64(v) => write!(f, "{v}"),
        }
    }
}

/// Ordered sequence with the element shape it was bound with.
#[derive(Clone, Debug)]
pub struct Sequence {
    elem: Shape,
    items: Vec<Value>,
}

impl Sequence {
    pub fn new(elem: Shape) -> Self {
        Sequence {
            elem,
            items: Vec::new(),
        }
    }

    pub fn from_items(elem: Shape, items: Vec<Value>) -> Self {
        Sequence { elem, items }
    }

    pub fn elem_shape(&self) -> &Shape {
        &self.elem
    }

    pub(crate) fn set_elem_shape(&mut self, elem: Shape) {
        self.elem = elem;
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Value> {
        &mut self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Insertion-ordered map with the key and value shapes it was bound with.
#[derive(Clone, Debug)]
pub struct Mapping {
    key: Shape,
    value: Shape,
    entries: Vec<(Value, Value)>,
    index: AHashMap<Value, usize>,
}

impl Mapping {
    pub fn new(key: Shape, value: Shape) -> Self {
        Mapping {
            key,
            value,
            entries: Vec::new(),
            index: AHashMap::new(),
        }
    }

    pub fn key_shape(&self) -> &Shape {
        &self.key
    }

    pub fn value_shape(&self) -> &Shape {
        &self.value
    }

    pub(crate) fn set_shapes(&mut self, key: Shape, value: Shape) {
        self.key = key;
        self.value = value;
    }

    /// Insert a new entry. Returns the pair back if the key is already present.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), (Value, Value)> {
        if self.index.contains_key(&key) {
            return Err((key, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.index.get(key).map(|idx| &self.entries[*idx].1)
    }

    /// Lookup by string key.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.get(&Value::String(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn into_entries(self) -> Vec<(Value, Value)> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|ov| ov == v))
    }
}

/// A bound record: one value per declared field, in declaration order.
#[derive(Clone, Debug)]
pub struct Record {
    info: Arc<RecordInfo>,
    fields: Vec<Value>,
}

impl Record {
    /// Record with every field at its zero value.
    pub fn zero(info: Arc<RecordInfo>) -> Self {
        let fields = info.fields().iter().map(|f| Value::zero(f.shape())).collect();
        Record { info, fields }
    }

    pub fn info(&self) -> &Arc<RecordInfo> {
        &self.info
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut [Value] {
        &mut self.fields
    }

    /// Field value by native name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.info
            .fields()
            .iter()
            .position(|f| f.name() == name)
            .map(|idx| &self.fields[idx])
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.info.type_id() == other.info.type_id() && self.fields == other.fields
    }
}

/// Generic bound value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Seq(Sequence),
    Map(Mapping),
    Record(Record),
}

impl Value {
    /// Zero value of a slot: what an unmentioned record field holds.
    pub fn zero(shape: &Shape) -> Value {
        match shape {
            Shape::Any | Shape::Option(_) => Value::Null,
            Shape::Bool => Value::Bool(false),
            Shape::I8 => Value::Number(Number::I8(0)),
            Shape::I16 => Value::Number(Number::I16(0)),
            Shape::I32 => Value::Number(Number::I32(0)),
            Shape::I64 => Value::Number(Number::I64(0)),
            Shape::U8 => Value::Number(Number::U8(0)),
            Shape::U16 => Value::Number(Number::U16(0)),
            Shape::U32 => Value::Number(Number::U32(0)),
            Shape::U64 => Value::Number(Number::U64(0)),
            Shape::F32 => Value::Number(Number::F32(0.0)),
            Shape::F64 => Value::Number(Number::F64(0.0)),
            Shape::Str => Value::String(String::new()),
            Shape::Seq(elem) => Value::Seq(Sequence::new((**elem).clone())),
            Shape::Map(k, v) => Value::Map(Mapping::new((**k).clone(), (**v).clone())),
            Shape::Record(info) => Value::Record(Record::zero(Arc::clone(info))),
        }
    }

    /// Dynamic shape of the value; `None` for null.
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(Shape::Bool),
            Value::Number(n) => Some(n.shape()),
            Value::String(_) => Some(Shape::Str),
            Value::Seq(s) => Some(Shape::seq(s.elem.clone())),
            Value::Map(m) => Some(Shape::map(m.key.clone(), m.value.clone())),
            Value::Record(r) => Some(Shape::Record(Arc::clone(&r.info))),
        }
    }

    /// Whether the value can be stored in a slot of the given shape.
    pub fn conforms_to(&self, shape: &Shape) -> bool {
        match (self, shape) {
            (_, Shape::Any) => true,
            (Value::Null, Shape::Option(_)) => true,
            (v, Shape::Option(inner)) => v.conforms_to(inner),
            (Value::Seq(s), Shape::Seq(elem)) => s.items.iter().all(|i| i.conforms_to(elem)),
            (Value::Map(m), Shape::Map(k, v)) => m
                .entries
                .iter()
                .all(|(mk, mv)| mk.conforms_to(k) && mv.conforms_to(v)),
            (v, s) => v.shape().as_ref() == Some(s),
        }
    }

    /// Scalars and null can key a generic map; collections cannot.
    pub fn is_hashable(&self) -> bool {
        !matches!(self, Value::Seq(_) | Value::Map(_) | Value::Record(_))
    }

    /// Null, `false`, zero, and empty strings and containers.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.is_zero(),
            Value::String(s) => s.is_empty(),
            Value::Seq(s) => s.is_empty(),
            Value::Map(m) => m.is_empty(),
            Value::Record(_) => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&Sequence> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Member lookup by string key on maps and records.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(m) => m.get_str(key),
            Value::Record(r) => r.get(key),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a.items == b.items,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => n.hash(state),
            Value::String(s) => s.hash(state),
            Value::Seq(s) => s.items.hash(state),
            // Map equality ignores order, so only the size goes into the hash.
            Value::Map(m) => m.len().hash(state),
            Value::Record(r) => r.fields.hash(state),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(Number::I64(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Number(Number::U64(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(Number::F64(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

/// Compact flow rendering, also used as the text of complex mapping keys.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) if is_flow_plain(s) => f.write_str(s),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Seq(s) => {
                f.write_str("[")?;
                for (i, item) in s.items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Record(r) => {
                f.write_str("{")?;
                for (i, (field, v)) in r.info.fields().iter().zip(&r.fields).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {v}", field.external_name())?;
                }
                f.write_str("}")
            }
        }
    }
}

fn is_flow_plain(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(' ')
        && !s.ends_with(' ')
        && !s
            .chars()
            .any(|c| c.is_control() || matches!(c, ',' | '[' | ']' | '{' | '}' | ':' | '#' | '"' | '\''))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_rejects_duplicates_and_keeps_order() {
        let mut m = Mapping::new(Shape::Any, Shape::Any);
        m.insert("b".into(), 1i64.into()).unwrap();
        m.insert("a".into(), 2i64.into()).unwrap();
        assert!(m.insert("b".into(), 3i64.into()).is_err());
        let keys: Vec<_> = m.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["b", "a"]);
        assert_eq!(m.get_str("b"), Some(&Value::from(1i64)));
    }

    #[test]
    fn float_keys_compare_by_bits() {
        let mut m = Mapping::new(Shape::Any, Shape::Any);
        m.insert(Value::from(f64::NAN), Value::Null).unwrap();
        assert!(m.contains_key(&Value::from(f64::NAN)));
    }

    #[test]
    fn flow_display() {
        let seq = Value::Seq(Sequence::from_items(
            Shape::Any,
            vec![1i64.into(), "x y".into(), "a:b".into(), Value::Null],
        ));
        assert_eq!(seq.to_string(), r#"[1, x y, "a:b", null]"#);
    }

    #[test]
    fn zero_values_follow_the_shape() {
        assert_eq!(Value::zero(&Shape::U8), Value::Number(Number::U8(0)));
        assert_eq!(Value::zero(&Shape::option(Shape::Str)), Value::Null);
        assert!(Value::zero(&Shape::seq(Shape::Str)).as_seq().is_some_and(Sequence::is_empty));
    }

    #[test]
    fn conformance() {
        let v = Value::Seq(Sequence::from_items(Shape::I64, vec![1i64.into()]));
        assert!(v.conforms_to(&Shape::seq(Shape::I64)));
        assert!(!v.conforms_to(&Shape::seq(Shape::Str)));
        assert!(Value::Null.conforms_to(&Shape::option(Shape::I64)));
        assert!(!Value::Null.conforms_to(&Shape::I64));
    }
}
