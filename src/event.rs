//! Parse events consumed by the binding engine and produced by the marshaler.

use std::fmt;

use crate::error::{Error, Location};
use crate::tags;

/// Kind of a stream event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    SequenceStart,
    SequenceEnd,
    MappingStart,
    MappingEnd,
    Scalar,
    Alias,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::StreamStart => "stream start",
            EventKind::StreamEnd => "stream end",
            EventKind::DocumentStart => "document start",
            EventKind::DocumentEnd => "document end",
            EventKind::SequenceStart => "sequence",
            EventKind::SequenceEnd => "sequence end",
            EventKind::MappingStart => "mapping",
            EventKind::MappingEnd => "mapping end",
            EventKind::Scalar => "scalar",
            EventKind::Alias => "alias",
        }
    }
}

/// Presentation style of a scalar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    /// Let the emitter choose. Only produced by the marshaler.
    Any,
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl ScalarStyle {
    /// Plain scalars are the only ones subject to implicit typing.
    pub fn is_plain(self) -> bool {
        matches!(self, ScalarStyle::Plain | ScalarStyle::Any)
    }
}

/// YAML version declared by a document (`%YAML 1.1`), or the default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const V1_1: Version = Version { major: 1, minor: 1 };
    pub const V1_2: Version = Version { major: 1, minor: 2 };
    pub const V1_3: Version = Version { major: 1, minor: 3 };
}

impl Default for Version {
    fn default() -> Self {
        Version::V1_2
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Metadata carried by `DocumentStart`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DocumentMeta {
    pub version: Version,
    /// Set when the document is known to be JSON.
    pub json: bool,
}

/// One unit of the parse stream.
///
/// For `Alias`, `value` holds the referenced anchor name. `value` is `None` for a scalar
/// with absent text (`key:`), which schemas treat as null.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub tag: Option<String>,
    pub anchor: Option<String>,
    pub implicit: bool,
    pub value: Option<String>,
    pub style: ScalarStyle,
    pub document: Option<DocumentMeta>,
    pub location: Location,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Event {
            kind,
            tag: None,
            anchor: None,
            implicit: true,
            value: None,
            style: ScalarStyle::Plain,
            document: None,
            location: Location::UNKNOWN,
        }
    }

    pub fn stream_start() -> Self {
        Event::new(EventKind::StreamStart)
    }

    pub fn stream_end() -> Self {
        Event::new(EventKind::StreamEnd)
    }

    pub fn document_start(meta: DocumentMeta) -> Self {
        Event {
            document: Some(meta),
            ..Event::new(EventKind::DocumentStart)
        }
    }

    pub fn document_end() -> Self {
        Event::new(EventKind::DocumentEnd)
    }

    pub fn sequence_start() -> Self {
        Event::new(EventKind::SequenceStart)
    }

    pub fn sequence_end() -> Self {
        Event::new(EventKind::SequenceEnd)
    }

    pub fn mapping_start() -> Self {
        Event::new(EventKind::MappingStart)
    }

    pub fn mapping_end() -> Self {
        Event::new(EventKind::MappingEnd)
    }

    /// Plain scalar with the given text.
    pub fn scalar(text: impl Into<String>) -> Self {
        Event {
            value: Some(text.into()),
            ..Event::new(EventKind::Scalar)
        }
    }

    /// Plain scalar with absent text.
    pub fn null_scalar() -> Self {
        Event::new(EventKind::Scalar)
    }

    pub fn alias(anchor: impl Into<String>) -> Self {
        Event {
            value: Some(anchor.into()),
            ..Event::new(EventKind::Alias)
        }
    }

    /// Attach an explicit tag; shorthand forms (`!!int`) are normalized.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tags::normalize(tag));
        self.implicit = false;
        self
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn with_style(mut self, style: ScalarStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Scalar text, or the anchor name an alias refers to.
    pub fn text(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Anchor name, treating an empty name as none.
    pub fn anchor_name(&self) -> Option<&str> {
        self.anchor.as_deref().filter(|a| !a.is_empty())
    }
}

/// A pull source of events.
pub trait EventSource {
    /// Next event, or `None` once the source is exhausted.
    fn next_event(&mut self) -> Result<Option<Event>, Error>;
}

/// Event source over any iterator of events.
pub struct IterEvents<I> {
    inner: I,
}

impl<I> IterEvents<I>
where
    I: Iterator<Item = Event>,
{
    pub fn new<T: IntoIterator<IntoIter = I>>(events: T) -> Self {
        IterEvents {
            inner: events.into_iter(),
        }
    }
}

impl<I> EventSource for IterEvents<I>
where
    I: Iterator<Item = Event>,
{
    fn next_event(&mut self) -> Result<Option<Event>, Error> {
        Ok(self.inner.next())
    }
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    fn next_event(&mut self) -> Result<Option<Event>, Error> {
        (**self).next_event()
    }
}
