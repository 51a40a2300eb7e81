//! Typed extraction from a bound [`Value`] tree through serde.
//!
//! - `ValueDeserializer` presents a `Value` as a self-describing serde source.
//! - Records are presented as maps keyed by native field names.
//! - Enums: a string selects a unit variant; a single-entry mapping selects a variant
//!   carrying data (`{ Variant: payload }`).
//!
//! `Value` itself implements `Deserialize`, building generic containers.

use std::fmt;

use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, IntoDeserializer, MapAccess, SeqAccess, Unexpected,
    Visitor,
};
use serde::forward_to_deserialize_any;

use crate::error::Error;
use crate::shape::Shape;
use crate::value::{Mapping, Number, Sequence, Value};

/// Build a `T` from a bound value.
///
/// ```rust
/// use saphyr_bind::Value;
///
/// let value: Value = saphyr_bind::from_str("[1, 2, 3]").unwrap();
/// let numbers: Vec<u8> = saphyr_bind::from_value(value).unwrap();
/// assert_eq!(numbers, [1, 2, 3]);
/// ```
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    T::deserialize(ValueDeserializer::new(value))
}

/// Serde deserializer over an owned [`Value`].
pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl Value {
    fn unexpected(&self) -> Unexpected<'_> {
        match self {
            Value::Null => Unexpected::Unit,
            Value::Bool(b) => Unexpected::Bool(*b),
            Value::Number(n) => match *n {
                Number::F32(v) => Unexpected::Float(v.into()),
                Number::F64(v) => Unexpected::Float(v),
                n => match n.as_i64() {
                    Some(v) => Unexpected::Signed(v),
                    None => Unexpected::Unsigned(n.as_u64().unwrap_or_default()),
                },
            },
            Value::String(s) => Unexpected::Str(s),
            Value::Seq(_) => Unexpected::Seq,
            Value::Map(_) | Value::Record(_) => Unexpected::Map,
        }
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = ValueDeserializer;

    fn into_deserializer(self) -> Self::Deserializer {
        ValueDeserializer::new(self)
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => match n {
                Number::I8(v) => visitor.visit_i8(v),
                Number::I16(v) => visitor.visit_i16(v),
                Number::I32(v) => visitor.visit_i32(v),
                Number::I64(v) => visitor.visit_i64(v),
                Number::U8(v) => visitor.visit_u8(v),
                Number::U16(v) => visitor.visit_u16(v),
                Number::U32(v) => visitor.visit_u32(v),
                Number::U64(v) => visitor.visit_u64(v),
                Number::F32(v) => visitor.visit_f32(v),
                Number::F64(v) => visitor.visit_f64(v),
            },
            Value::String(s) => visitor.visit_string(s),
            Value::Seq(seq) => {
                let mut access = SeqDeserializer::<_, Error>::new(seq.into_items().into_iter());
                let out = visitor.visit_seq(&mut access)?;
                access.end()?;
                Ok(out)
            }
            Value::Map(map) => {
                let mut access = MapDeserializer::<_, Error>::new(map.into_entries().into_iter());
                let out = visitor.visit_map(&mut access)?;
                access.end()?;
                Ok(out)
            }
            Value::Record(record) => {
                let entries: Vec<(Value, Value)> = record
                    .info()
                    .fields()
                    .iter()
                    .map(|f| Value::from(f.name()))
                    .zip(record.fields().iter().cloned())
                    .collect();
                let mut access = MapDeserializer::<_, Error>::new(entries.into_iter());
                let out = visitor.visit_map(&mut access)?;
                access.end()?;
                Ok(out)
            }
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.value {
            Value::String(s) => {
                let variant: StringDeserializer<Error> = s.into_deserializer();
                visitor.visit_enum(variant)
            }
            Value::Map(map) if map.len() == 1 => {
                let mut entries = map.into_entries().into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer { variant, value }),
                    None => Err(de::Error::custom("empty mapping cannot select an enum variant")),
                }
            }
            other => Err(de::Error::invalid_type(
                other.unexpected(),
                &"a variant name or a single-entry mapping",
            )),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        drop(self);
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct identifier
    }
}

struct EnumDeserializer {
    variant: Value,
    value: Value,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<S: DeserializeSeed<'de>>(
        self,
        seed: S,
    ) -> Result<(S::Value, Self::Variant), Error> {
        let variant = seed.deserialize(ValueDeserializer::new(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        match self.value {
            Value::Null => Ok(()),
            other => Err(de::Error::invalid_type(other.unexpected(), &"unit variant")),
        }
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, Error> {
        seed.deserialize(ValueDeserializer::new(self.value))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_seq(ValueDeserializer::new(self.value), visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_map(ValueDeserializer::new(self.value), visitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(Number::I64(v)))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(Number::U64(v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(Number::F64(v)))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        de::Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0).min(4096));
        while let Some(item) = access.next_element()? {
            items.push(item);
        }
        Ok(Value::Seq(Sequence::from_items(Shape::Any, items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Mapping::new(Shape::Any, Shape::Any);
        while let Some((key, value)) = access.next_entry::<Value, Value>()? {
            map.insert(key, value)
                .map_err(|(key, _)| de::Error::custom(format_args!("duplicate key {key}")))?;
        }
        Ok(Value::Map(map))
    }
}

impl<'de> de::Deserialize<'de> for Value {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        let mut map = Mapping::new(Shape::Str, Shape::Any);
        for (k, v) in entries {
            map.insert(Value::from(k), v).unwrap();
        }
        Value::Map(map)
    }

    #[derive(Debug, Deserialize, PartialEq)]
    enum Figure {
        Point,
        Circle(f64),
        Rect { w: u32, h: u32 },
    }

    #[test]
    fn enums_from_strings_and_single_entry_maps() {
        assert_eq!(from_value::<Figure>(Value::from("Point")).unwrap(), Figure::Point);
        assert_eq!(
            from_value::<Figure>(map(vec![("Circle", Value::from(1.5))])).unwrap(),
            Figure::Circle(1.5)
        );
        let rect = map(vec![(
            "Rect",
            map(vec![("w", Value::from(2i64)), ("h", Value::from(3i64))]),
        )]);
        assert_eq!(from_value::<Figure>(rect).unwrap(), Figure::Rect { w: 2, h: 3 });
        assert!(from_value::<Figure>(Value::from(true)).is_err());
    }

    #[test]
    fn numbers_convert_with_range_checks() {
        assert_eq!(from_value::<u8>(Value::from(200i64)).unwrap(), 200);
        assert!(from_value::<u8>(Value::from(300i64)).is_err());
        assert_eq!(from_value::<f64>(Value::from(3i64)).unwrap(), 3.0);
        assert_eq!(from_value::<Option<i32>>(Value::Null).unwrap(), None);
    }

    #[test]
    fn maps_and_value_round_trip() {
        let value = map(vec![("a", Value::from(1i64)), ("b", Value::from(2i64))]);
        let typed: BTreeMap<String, i64> = from_value(value.clone()).unwrap();
        assert_eq!(typed["b"], 2);
        let back: Value = from_value(value.clone()).unwrap();
        assert_eq!(back, value);
    }
}
