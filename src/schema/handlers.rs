//! Tag handlers: per-kind validation of target slots and scalar conversion.

use std::fmt;

use crate::error::{Error, Location};
use crate::parse_scalars::{self, IntError};
use crate::path::Path;
use crate::schema::resolve::{self, Flavor};
use crate::shape::Shape;
use crate::tags;
use crate::value::{Number, Value};

/// Which binding a handler produces and which events it may own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Str,
    Bool,
    Null,
    Int,
    Float,
    Seq,
    Map,
    /// The hidden handler of `*alias` nodes.
    Alias,
}

impl HandlerKind {
    pub fn is_scalar(self) -> bool {
        !matches!(self, HandlerKind::Seq | HandlerKind::Map | HandlerKind::Alias)
    }
}

/// Per-kind logic for validating and populating a target slot.
///
/// Schemas own a set of handlers and pick one per event. Custom schemas may supply their
/// own implementations; the binding produced is chosen by [`TagHandler::kind`].
pub trait TagHandler: Send + Sync + fmt::Debug {
    /// Canonical tag URI. Empty for the alias handler.
    fn tag(&self) -> &str;

    fn kind(&self) -> HandlerKind;

    /// Concrete shape this handler binds into when the slot is declared as `target`,
    /// or `None` when the slot cannot hold this kind.
    fn specify(&self, target: &Shape) -> Option<Shape>;

    /// Convert scalar text into a value for a slot of shape `target`.
    ///
    /// `target` has already passed `specify`. Only scalar-kind handlers override this.
    fn set_scalar(
        &self,
        text: Option<&str>,
        target: &Shape,
        flavor: Flavor,
        path: &Path,
    ) -> Result<Value, Error> {
        let _ = (text, flavor);
        Err(mismatch(path, self.tag(), target))
    }
}

pub(crate) fn mismatch(path: &Path, tag: &str, target: &Shape) -> Error {
    Error::TargetKindMismatch {
        path: path.to_string(),
        tag: if tag.is_empty() {
            "alias".to_string()
        } else {
            tags::short(tag)
        },
        target: target.clone(),
        location: Location::UNKNOWN,
    }
}

fn invalid(path: &Path, tag: &str, text: Option<&str>) -> Error {
    Error::InvalidScalarLiteral {
        path: path.to_string(),
        tag: tags::short(tag),
        text: text.unwrap_or_default().to_string(),
        location: Location::UNKNOWN,
    }
}

fn overflow(path: &Path, text: &str, target: &Shape) -> Error {
    Error::NumericOverflow {
        path: path.to_string(),
        text: text.to_string(),
        target: target.clone(),
        location: Location::UNKNOWN,
    }
}

#[derive(Debug, Default)]
pub struct StrTag;

impl TagHandler for StrTag {
    fn tag(&self) -> &str {
        tags::TAG_STR
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Str
    }

    fn specify(&self, target: &Shape) -> Option<Shape> {
        match target {
            Shape::Any | Shape::Str => Some(Shape::Str),
            _ => None,
        }
    }

    fn set_scalar(&self, text: Option<&str>, _: &Shape, _: Flavor, _: &Path) -> Result<Value, Error> {
        Ok(Value::String(text.unwrap_or_default().to_string()))
    }
}

#[derive(Debug, Default)]
pub struct BoolTag;

impl TagHandler for BoolTag {
    fn tag(&self) -> &str {
        tags::TAG_BOOL
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Bool
    }

    fn specify(&self, target: &Shape) -> Option<Shape> {
        match target {
            Shape::Any | Shape::Bool => Some(Shape::Bool),
            _ => None,
        }
    }

    fn set_scalar(
        &self,
        text: Option<&str>,
        _: &Shape,
        flavor: Flavor,
        path: &Path,
    ) -> Result<Value, Error> {
        text.and_then(|t| resolve::bool_literal(flavor, t))
            .map(Value::Bool)
            .ok_or_else(|| invalid(path, self.tag(), text))
    }
}

#[derive(Debug, Default)]
pub struct NullTag;

impl TagHandler for NullTag {
    fn tag(&self) -> &str {
        tags::TAG_NULL
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Null
    }

    fn specify(&self, target: &Shape) -> Option<Shape> {
        match target {
            Shape::Any | Shape::Option(_) => Some(target.clone()),
            _ => None,
        }
    }

    fn set_scalar(
        &self,
        text: Option<&str>,
        _: &Shape,
        flavor: Flavor,
        path: &Path,
    ) -> Result<Value, Error> {
        if resolve::is_null_literal(flavor, text) {
            Ok(Value::Null)
        } else {
            Err(invalid(path, self.tag(), text))
        }
    }
}

#[derive(Debug, Default)]
pub struct IntTag;

impl IntTag {
    fn parse(&self, text: &str, target: &Shape, flavor: Flavor, path: &Path) -> Result<Value, Error> {
        let (digits, radix) = if flavor == Flavor::Json {
            (text, 10)
        } else {
            parse_scalars::split_radix(text)
        };
        let fail = |e: IntError| match e {
            IntError::Invalid => invalid(path, self.tag(), Some(text)),
            IntError::Overflow => overflow(path, text, target),
        };

        match target {
            // Generic slots parse at 64 bits. Decimal text that overflows i64 is retried
            // as u64 so that values up to u64::MAX still bind; prefixed text is unsigned.
            Shape::Any if radix == 10 => match parse_scalars::parse_signed(digits, 64) {
                Ok(v) => Ok(Value::Number(Number::I64(v))),
                Err(IntError::Overflow) => parse_scalars::parse_unsigned(digits, 10, 64)
                    .map(|v| Value::Number(Number::U64(v)))
                    .map_err(fail),
                Err(e) => Err(fail(e)),
            },
            Shape::Any => parse_scalars::parse_unsigned(digits, radix, 64)
                .map(|v| Value::Number(Number::U64(v)))
                .map_err(fail),
            Shape::F32 | Shape::F64 => {
                // Integers must be exactly representable in the mantissa.
                let bits = if matches!(target, Shape::F32) { 24 } else { 53 };
                let v = if radix == 10 {
                    parse_scalars::parse_signed(digits, bits + 1).map_err(fail)? as f64
                } else {
                    parse_scalars::parse_unsigned(digits, radix, bits).map_err(fail)? as f64
                };
                Ok(Value::Number(if bits == 24 {
                    Number::F32(v as f32)
                } else {
                    Number::F64(v)
                }))
            }
            _ => {
                let Some((bits, signed)) = target.int_precision() else {
                    return Err(mismatch(path, self.tag(), target));
                };
                if signed {
                    let v = if radix == 10 {
                        parse_scalars::parse_signed(digits, bits).map_err(fail)?
                    } else {
                        // Prefixed text fills the magnitude bits only.
                        parse_scalars::parse_unsigned(digits, radix, bits - 1).map_err(fail)? as i64
                    };
                    Ok(Value::Number(narrow_signed(v, bits)))
                } else {
                    let v = parse_scalars::parse_unsigned(digits, radix, bits).map_err(fail)?;
                    Ok(Value::Number(narrow_unsigned(v, bits)))
                }
            }
        }
    }
}

// Range was checked by the parser.
fn narrow_signed(v: i64, bits: u32) -> Number {
    match bits {
        8 => Number::I8(v as i8),
        16 => Number::I16(v as i16),
        32 => Number::I32(v as i32),
        _ => Number::I64(v),
    }
}

fn narrow_unsigned(v: u64, bits: u32) -> Number {
    match bits {
        8 => Number::U8(v as u8),
        16 => Number::U16(v as u16),
        32 => Number::U32(v as u32),
        _ => Number::U64(v),
    }
}

impl TagHandler for IntTag {
    fn tag(&self) -> &str {
        tags::TAG_INT
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Int
    }

    fn specify(&self, target: &Shape) -> Option<Shape> {
        match target {
            Shape::Any => Some(Shape::I64),
            t if t.is_int() || t.is_float() => Some(t.clone()),
            _ => None,
        }
    }

    fn set_scalar(
        &self,
        text: Option<&str>,
        target: &Shape,
        flavor: Flavor,
        path: &Path,
    ) -> Result<Value, Error> {
        let text = text.ok_or_else(|| invalid(path, self.tag(), None))?;
        self.parse(text, target, flavor, path)
    }
}

#[derive(Debug, Default)]
pub struct FloatTag;

impl TagHandler for FloatTag {
    fn tag(&self) -> &str {
        tags::TAG_FLOAT
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Float
    }

    fn specify(&self, target: &Shape) -> Option<Shape> {
        match target {
            Shape::Any => Some(Shape::F64),
            Shape::F32 | Shape::F64 => Some(target.clone()),
            _ => None,
        }
    }

    fn set_scalar(
        &self,
        text: Option<&str>,
        target: &Shape,
        _: Flavor,
        path: &Path,
    ) -> Result<Value, Error> {
        let parsed = match (text, target) {
            (Some(t), Shape::F32) => parse_scalars::parse_f32(t).map(Number::F32),
            (Some(t), _) => parse_scalars::parse_f64(t).map(Number::F64),
            (None, _) => None,
        };
        parsed
            .map(Value::Number)
            .ok_or_else(|| invalid(path, self.tag(), text))
    }
}

#[derive(Debug, Default)]
pub struct SeqTag;

impl TagHandler for SeqTag {
    fn tag(&self) -> &str {
        tags::TAG_SEQ
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Seq
    }

    fn specify(&self, target: &Shape) -> Option<Shape> {
        match target {
            Shape::Any => Some(Shape::seq(Shape::Any)),
            Shape::Seq(_) => Some(target.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MapTag;

impl TagHandler for MapTag {
    fn tag(&self) -> &str {
        tags::TAG_MAP
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Map
    }

    fn specify(&self, target: &Shape) -> Option<Shape> {
        match target {
            Shape::Any => Some(Shape::map(Shape::Any, Shape::Any)),
            Shape::Map(..) | Shape::Record(_) => Some(target.clone()),
            _ => None,
        }
    }
}

/// Owns `*alias` nodes. Has no tag, so explicit tag lookup never finds it.
#[derive(Debug, Default)]
pub struct AliasTag;

impl TagHandler for AliasTag {
    fn tag(&self) -> &str {
        ""
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Alias
    }

    fn specify(&self, target: &Shape) -> Option<Shape> {
        Some(target.clone())
    }
}
