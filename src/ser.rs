//! Marshaling: values to event streams.
//!
//! Two entry points share one event sink:
//! - a serde `Serializer`, for any `T: Serialize`;
//! - a direct walk over [`Value`], which also honours record field flags
//!   (`ignored`, `omit_empty`, `as_string`) and external field names.
//!
//! The output is always `StreamStart, DocumentStart, <node>, DocumentEnd, StreamEnd`.
//! No anchors are emitted: shared data is written out once per reference. Nesting
//! deeper than `SerializerOptions::max_depth` is rejected, which also stops cyclic data.
//!
//! Usage example:
//!
//! ```rust
//! use saphyr_bind::{EventKind, ScalarStyle};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Cfg {
//!     name: String,
//!     ports: Vec<u16>,
//! }
//!
//! let events = saphyr_bind::to_events(&Cfg {
//!     name: "42".into(),
//!     ports: vec![8080],
//! })
//! .unwrap();
//! assert_eq!(events[2].kind, EventKind::MappingStart);
//! // "42" would read back as an integer, so it is quoted.
//! assert_eq!(events[4].style, ScalarStyle::DoubleQuoted);
//! ```

use serde::ser::{
    self, Serialize, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant,
    SerializeTuple, SerializeTupleStruct, SerializeTupleVariant, Serializer,
};

use crate::error::Error;
use crate::event::{DocumentMeta, Event, ScalarStyle};
use crate::ser_quoting::is_plain_safe;
use crate::serializer_options::SerializerOptions;
use crate::value::{Number, Value};
use crate::zmij_format::float_string;

/// Result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Marshal `value` into an event stream with default options.
pub fn to_events<T: Serialize + ?Sized>(value: &T) -> Result<Vec<Event>> {
    to_events_with_options(value, SerializerOptions::default())
}

/// Marshal `value` into an event stream.
///
/// ```rust
/// let events = saphyr_bind::to_events_with_options(
///     &Option::<u8>::None,
///     saphyr_bind::ser_options! { json_null: true },
/// )
/// .unwrap();
/// assert_eq!(events[2].text(), Some("null"));
/// ```
pub fn to_events_with_options<T: Serialize + ?Sized>(
    value: &T,
    options: SerializerOptions,
) -> Result<Vec<Event>> {
    let mut sink = EventSink::new(options);
    value.serialize(&mut sink)?;
    Ok(sink.finish())
}

/// Marshal a bound [`Value`] into an event stream.
///
/// Records emit their fields in declaration order under their external names, skipping
/// ignored fields and empty `omit_empty` fields; `as_string` fields are double-quoted.
pub fn value_to_events(value: &Value, options: SerializerOptions) -> Result<Vec<Event>> {
    let mut sink = EventSink::new(options);
    sink.value(value)?;
    Ok(sink.finish())
}

/// Collects events and tracks nesting.
struct EventSink {
    events: Vec<Event>,
    options: SerializerOptions,
    depth: usize,
}

impl EventSink {
    fn new(options: SerializerOptions) -> Self {
        EventSink {
            events: vec![
                Event::stream_start(),
                Event::document_start(DocumentMeta::default()),
            ],
            options,
            depth: 0,
        }
    }

    fn finish(mut self) -> Vec<Event> {
        self.events.push(Event::document_end());
        self.events.push(Event::stream_end());
        self.events
    }

    fn open(&mut self, start: Event) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(Error::msg(format!(
                "nesting deeper than {} levels (cyclic data?)",
                self.options.max_depth
            )));
        }
        self.events.push(start);
        Ok(())
    }

    fn close(&mut self, end: Event) {
        self.depth = self.depth.saturating_sub(1);
        self.events.push(end);
    }

    fn plain(&mut self, text: String) {
        self.events.push(Event::scalar(text));
    }

    fn string(&mut self, s: &str) {
        let style = if is_plain_safe(s) {
            ScalarStyle::Plain
        } else {
            ScalarStyle::DoubleQuoted
        };
        self.events.push(Event::scalar(s).with_style(style));
    }

    fn null(&mut self) {
        let text = if self.options.json_null { "null" } else { "~" };
        self.plain(text.to_string());
    }

    fn number(&mut self, n: &Number) {
        let text = match *n {
            Number::F32(v) => float_string(v),
            Number::F64(v) => float_string(v),
            other => other.to_string(),
        };
        self.plain(text);
    }

    fn value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.null(),
            Value::Bool(b) => self.plain(b.to_string()),
            Value::Number(n) => self.number(n),
            Value::String(s) => self.string(s),
            Value::Seq(seq) => {
                self.open(Event::sequence_start())?;
                for item in seq.items() {
                    self.value(item)?;
                }
                self.close(Event::sequence_end());
            }
            Value::Map(map) => {
                self.open(Event::mapping_start())?;
                for (k, v) in map.iter() {
                    self.value(k)?;
                    self.value(v)?;
                }
                self.close(Event::mapping_end());
            }
            Value::Record(record) => {
                self.open(Event::mapping_start())?;
                for (field, v) in record.info().fields().iter().zip(record.fields()) {
                    if field.is_ignored() || (field.omit_empty && v.is_empty()) {
                        continue;
                    }
                    self.string(field.external_name());
                    if field.as_string && !v.is_null() {
                        let text = match v {
                            Value::String(s) => s.clone(),
                            Value::Number(n) => match *n {
                                Number::F32(f) => float_string(f),
                                Number::F64(f) => float_string(f),
                                other => other.to_string(),
                            },
                            other => other.to_string(),
                        };
                        self.events
                            .push(Event::scalar(text).with_style(ScalarStyle::DoubleQuoted));
                    } else {
                        self.value(v)?;
                    }
                }
                self.close(Event::mapping_end());
            }
        }
        Ok(())
    }
}

impl<'a> Serializer for &'a mut EventSink {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.plain(v.to_string());
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(v.into())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.plain(v.to_string());
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.plain(v.to_string());
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(v.into())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.plain(v.to_string());
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.plain(v.to_string());
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.plain(float_string(v));
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.plain(float_string(v));
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.string(v.encode_utf8(&mut buf));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.string(v);
        Ok(())
    }

    // Bytes go out as a sequence of small integers.
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.open(Event::sequence_start())?;
        for b in v {
            self.plain(b.to_string());
        }
        self.close(Event::sequence_end());
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        self.null();
        Ok(())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.null();
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.open(Event::mapping_start())?;
        self.string(variant);
        value.serialize(&mut *self)?;
        self.close(Event::mapping_end());
        Ok(())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.open(Event::sequence_start())?;
        Ok(self)
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.open(Event::mapping_start())?;
        self.string(variant);
        self.open(Event::sequence_start())?;
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.open(Event::mapping_start())?;
        Ok(self)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(None)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.open(Event::mapping_start())?;
        self.string(variant);
        self.open(Event::mapping_start())?;
        Ok(self)
    }
}

impl SerializeSeq for &mut EventSink {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        self.close(Event::sequence_end());
        Ok(())
    }
}

impl SerializeTuple for &mut EventSink {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleStruct for &mut EventSink {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        SerializeSeq::end(self)
    }
}

impl SerializeTupleVariant for &mut EventSink {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        self.close(Event::sequence_end());
        self.close(Event::mapping_end());
        Ok(())
    }
}

impl SerializeMap for &mut EventSink {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        key.serialize(&mut **self)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        self.close(Event::mapping_end());
        Ok(())
    }
}

impl SerializeStruct for &mut EventSink {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.string(key);
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        SerializeMap::end(self)
    }
}

impl SerializeStructVariant for &mut EventSink {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.string(key);
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        self.close(Event::mapping_end());
        self.close(Event::mapping_end());
        Ok(())
    }
}

/// Record field rendered as its string form.
struct AsString<'a>(&'a Value);

impl Serialize for AsString<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::String(s) => serializer.serialize_str(s),
            Value::Null => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => match *n {
                Number::I8(v) => serializer.serialize_i8(v),
                Number::I16(v) => serializer.serialize_i16(v),
                Number::I32(v) => serializer.serialize_i32(v),
                Number::I64(v) => serializer.serialize_i64(v),
                Number::U8(v) => serializer.serialize_u8(v),
                Number::U16(v) => serializer.serialize_u16(v),
                Number::U32(v) => serializer.serialize_u32(v),
                Number::U64(v) => serializer.serialize_u64(v),
                Number::F32(v) => serializer.serialize_f32(v),
                Number::F64(v) => serializer.serialize_f64(v),
            },
            Value::String(s) => serializer.serialize_str(s),
            Value::Seq(seq) => {
                let mut out = serializer.serialize_seq(Some(seq.len()))?;
                for item in seq.items() {
                    out.serialize_element(item)?;
                }
                out.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Record(record) => {
                let mut out = serializer.serialize_map(None)?;
                for (field, v) in record.info().fields().iter().zip(record.fields()) {
                    if field.is_ignored() || (field.omit_empty && v.is_empty()) {
                        continue;
                    }
                    if field.as_string {
                        out.serialize_entry(field.external_name(), &AsString(v))?;
                    } else {
                        out.serialize_entry(field.external_name(), v)?;
                    }
                }
                out.end()
            }
        }
    }
}

impl ser::Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Value::Number(*self).serialize(serializer)
    }
}
