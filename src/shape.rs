//! Declared shapes of storage slots.
//!
//! A `Shape` is what the binding engine knows statically about the slot it is filling:
//! either a concrete kind (`I32`, `Str`, a record...) or `Any`, the generic slot that
//! accepts whatever the schema infers. `Shaped` connects Rust types to shapes so that
//! `from_str::<T>` can bind directly into the shape of `T`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::type_cache::{self, Field, RecordInfo};
use crate::value::Value;

/// Declared kind of a storage slot.
#[derive(Clone, Debug)]
pub enum Shape {
    /// Generic slot; the schema decides what to put in it.
    Any,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Str,
    /// Nullable slot holding either null or a value of the inner shape.
    Option(Box<Shape>),
    Seq(Box<Shape>),
    Map(Box<Shape>, Box<Shape>),
    Record(Arc<RecordInfo>),
}

impl Shape {
    pub fn option(inner: Shape) -> Shape {
        Shape::Option(Box::new(inner))
    }

    pub fn seq(elem: Shape) -> Shape {
        Shape::Seq(Box::new(elem))
    }

    pub fn map(key: Shape, value: Shape) -> Shape {
        Shape::Map(Box::new(key), Box::new(value))
    }

    /// Shape of a record type, building its field table on first use.
    ///
    /// `fields` is only invoked when `T` is not in the process-wide cache yet.
    pub fn record<T: 'static>(fields: impl FnOnce() -> Vec<Field>) -> Shape {
        Shape::Record(type_cache::record_info::<T>(fields))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Shape::Any)
    }

    /// `Any`, or a collection of `Any`: nothing to learn from it when tightening.
    pub fn is_fully_generic(&self) -> bool {
        match self {
            Shape::Any => true,
            Shape::Seq(elem) => elem.is_any(),
            Shape::Map(k, v) => k.is_any() && v.is_any(),
            _ => false,
        }
    }

    /// Bit width and signedness of integer shapes.
    pub fn int_precision(&self) -> Option<(u32, bool)> {
        match self {
            Shape::I8 => Some((8, true)),
            Shape::I16 => Some((16, true)),
            Shape::I32 => Some((32, true)),
            Shape::I64 => Some((64, true)),
            Shape::U8 => Some((8, false)),
            Shape::U16 => Some((16, false)),
            Shape::U32 => Some((32, false)),
            Shape::U64 => Some((64, false)),
            _ => None,
        }
    }

    pub fn is_int(&self) -> bool {
        self.int_precision().is_some()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Shape::F32 | Shape::F64)
    }

    /// Shapes whose slot holds a single scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Shape::Bool | Shape::Str) || self.is_int() || self.is_float()
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Shape::Option(a), Shape::Option(b)) => a == b,
            (Shape::Seq(a), Shape::Seq(b)) => a == b,
            (Shape::Map(ak, av), Shape::Map(bk, bv)) => ak == bk && av == bv,
            (Shape::Record(a), Shape::Record(b)) => a.type_id() == b.type_id(),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Shape::Option(inner) | Shape::Seq(inner) => inner.hash(state),
            Shape::Map(k, v) => {
                k.hash(state);
                v.hash(state);
            }
            Shape::Record(info) => info.type_id().hash(state),
            _ => {}
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => f.write_str("any"),
            Shape::Bool => f.write_str("bool"),
            Shape::I8 => f.write_str("i8"),
            Shape::I16 => f.write_str("i16"),
            Shape::I32 => f.write_str("i32"),
            Shape::I64 => f.write_str("i64"),
            Shape::U8 => f.write_str("u8"),
            Shape::U16 => f.write_str("u16"),
            Shape::U32 => f.write_str("u32"),
            Shape::U64 => f.write_str("u64"),
            Shape::F32 => f.write_str("f32"),
            Shape::F64 => f.write_str("f64"),
            Shape::Str => f.write_str("string"),
            Shape::Option(inner) => write!(f, "option<{inner}>"),
            Shape::Seq(elem) => write!(f, "seq<{elem}>"),
            Shape::Map(k, v) => write!(f, "map<{k}, {v}>"),
            Shape::Record(info) => write!(f, "record {}", info.name()),
        }
    }
}

/// Types with a statically known shape.
///
/// Implemented here for the primitives and std containers. Records implement it with
/// [`Shape::record`]:
///
/// ```
/// use saphyr_bind::{Field, Shape, Shaped};
///
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// impl Shaped for Server {
///     fn shape() -> Shape {
///         Shape::record::<Self>(|| {
///             vec![Field::of::<String>("host"), Field::of::<u16>("port")]
///         })
///     }
/// }
/// ```
pub trait Shaped {
    fn shape() -> Shape;

    /// Extract `Self` from a value bound to `Self::shape()`.
    ///
    /// Goes through serde by default. `Value` returns the bound tree itself, keeping
    /// tightened container shapes and records.
    fn from_bound(value: Value) -> Result<Self, Error>
    where
        Self: Sized + DeserializeOwned,
    {
        crate::value_de::from_value(value)
    }
}

macro_rules! shaped_primitive {
    ($($t:ty => $s:expr),* $(,)?) => {
        $(
            impl Shaped for $t {
                fn shape() -> Shape {
                    $s
                }
            }
        )*
    };
}

shaped_primitive! {
    bool => Shape::Bool,
    i8 => Shape::I8,
    i16 => Shape::I16,
    i32 => Shape::I32,
    i64 => Shape::I64,
    isize => Shape::I64,
    u8 => Shape::U8,
    u16 => Shape::U16,
    u32 => Shape::U32,
    u64 => Shape::U64,
    usize => Shape::U64,
    f32 => Shape::F32,
    f64 => Shape::F64,
    String => Shape::Str,
    char => Shape::Str,
}

impl Shaped for Value {
    fn shape() -> Shape {
        Shape::Any
    }

    fn from_bound(value: Value) -> Result<Self, Error> {
        Ok(value)
    }
}

impl<T: Shaped> Shaped for Option<T> {
    fn shape() -> Shape {
        Shape::option(T::shape())
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> Shape {
        Shape::seq(T::shape())
    }
}

impl<T: Shaped> Shaped for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: Shaped> Shaped for Arc<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<K: Shaped, V: Shaped, S> Shaped for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::map(K::shape(), V::shape())
    }
}

impl<K: Shaped, V: Shaped> Shaped for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::map(K::shape(), V::shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_shapes_compose() {
        assert_eq!(
            <HashMap<String, Vec<Option<u8>>>>::shape(),
            Shape::map(Shape::Str, Shape::seq(Shape::option(Shape::U8)))
        );
        assert_eq!(<Box<i32>>::shape(), Shape::I32);
    }

    #[test]
    fn fully_generic_shapes() {
        assert!(Shape::Any.is_fully_generic());
        assert!(Shape::seq(Shape::Any).is_fully_generic());
        assert!(!Shape::seq(Shape::I64).is_fully_generic());
        assert!(!Shape::map(Shape::Str, Shape::Any).is_fully_generic());
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(Shape::map(Shape::Str, Shape::seq(Shape::F64)).to_string(), "map<string, seq<f64>>");
    }
}
