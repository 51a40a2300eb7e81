//!
//! Live events: the adapter from `saphyr_parser::Parser` to this crate's [`Event`].
//!
//! Responsibilities
//! - Translate every parser event, stream and document markers included.
//! - Attach document metadata (YAML version, JSON flag) to `DocumentStart`.
//! - Normalize tags to canonical URIs and turn empty plain scalars into absent text.
//! - Name anchors: the parser numbers them, so the number becomes the name.
//! - Track source locations for diagnostics.
//!
//! Unlike a replaying event source, aliases are passed through untouched; the binding
//! engine resolves them against values it has already bound.

use saphyr_parser::{Event as RawEvent, Parser, ScalarStyle as RawStyle, Span, StrInput};

use crate::error::{Error, Location};
use crate::event::{DocumentMeta, Event, EventKind, EventSource, ScalarStyle, Version};
use crate::options::{JsonMode, Options};

fn location_from_span(span: &Span) -> Location {
    let start = &span.start;
    Location::new(start.line(), start.col() + 1)
}

/// Name of the alias the scanner stopped at, read back from the source line.
fn alias_name_at(input: &str, line: usize, col: usize) -> Option<String> {
    let text = input.lines().nth(line.checked_sub(1)?)?;
    let chars: Vec<char> = text.chars().collect();
    let star = chars[..col.min(chars.len())]
        .iter()
        .rposition(|&c| c == '*')
        .or_else(|| chars.iter().position(|&c| c == '*'))?;
    let name: String = chars[star + 1..]
        .iter()
        .take_while(|c| !c.is_whitespace() && !matches!(c, ',' | '[' | ']' | '{' | '}'))
        .collect();
    (!name.is_empty()).then_some(name)
}

/// The parser itself rejects aliases to anchors it has not seen; report those as
/// unresolved aliases rather than syntax errors.
fn scan_error(input: &str, err: saphyr_parser::ScanError) -> Error {
    if err.info().contains("unknown anchor") {
        let mark = err.marker();
        let location = Location::new(mark.line(), mark.col() + 1);
        return Error::UnresolvedAlias {
            path: String::new(),
            anchor: alias_name_at(input, mark.line(), mark.col() + 1).unwrap_or_default(),
            location,
        };
    }
    Error::from_scan_error(err)
}

fn anchor_from_id(anchor_id: usize) -> Option<String> {
    (anchor_id != 0).then(|| anchor_id.to_string())
}

fn style_from_raw(style: RawStyle) -> ScalarStyle {
    match style {
        RawStyle::Plain => ScalarStyle::Plain,
        RawStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        RawStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        RawStyle::Literal => ScalarStyle::Literal,
        RawStyle::Folded => ScalarStyle::Folded,
    }
}

/// Event source over YAML text.
pub struct LiveEvents<'a> {
    /// Underlying streaming parser that produces raw events from the input.
    parser: Parser<'a, StrInput<'a>>,
    input: &'a str,
    meta: DocumentMeta,
    /// Location of the last yielded event.
    last_location: Location,
    done: bool,
}

impl<'a> LiveEvents<'a> {
    /// Event source for `input`. `options` decide the version and JSON flag that every
    /// document reports.
    pub fn new(input: &'a str, options: &Options) -> Self {
        Self {
            parser: Parser::new_from_str(input),
            input,
            meta: DocumentMeta {
                version: options.version.unwrap_or_default(),
                json: options.json == JsonMode::Force,
            },
            last_location: Location::UNKNOWN,
            done: false,
        }
    }

    /// Event source reporting YAML 1.2 documents.
    pub fn from_str(input: &'a str) -> Self {
        LiveEvents::new(input, &Options::default())
    }

    pub fn version(&self) -> Version {
        self.meta.version
    }

    pub fn last_location(&self) -> Location {
        self.last_location
    }

    fn translate(&self, raw: RawEvent<'a>) -> Option<Event> {
        let ev = match raw {
            RawEvent::StreamStart => Event::stream_start(),
            RawEvent::StreamEnd => Event::stream_end(),
            RawEvent::DocumentStart(_) => Event::document_start(self.meta),
            RawEvent::DocumentEnd => Event::document_end(),
            RawEvent::Scalar(val, style, anchor_id, tag) => {
                let style = style_from_raw(style);
                let mut ev = Event::new(EventKind::Scalar);
                // Empty plain text (`key:`) is absent, not an empty string.
                if !(val.is_empty() && style == ScalarStyle::Plain) {
                    ev.value = Some(val.into_owned());
                }
                ev.style = style;
                ev.anchor = anchor_from_id(anchor_id);
                if let Some(tag) = tag {
                    ev = ev.with_tag(&tag.to_string());
                }
                ev
            }
            RawEvent::SequenceStart(anchor_id, tag) => {
                let mut ev = Event::sequence_start();
                ev.anchor = anchor_from_id(anchor_id);
                if let Some(tag) = tag {
                    ev = ev.with_tag(&tag.to_string());
                }
                ev
            }
            RawEvent::SequenceEnd => Event::sequence_end(),
            RawEvent::MappingStart(anchor_id, tag) => {
                let mut ev = Event::mapping_start();
                ev.anchor = anchor_from_id(anchor_id);
                if let Some(tag) = tag {
                    ev = ev.with_tag(&tag.to_string());
                }
                ev
            }
            RawEvent::MappingEnd => Event::mapping_end(),
            RawEvent::Alias(anchor_id) => Event::alias(anchor_id.to_string()),
            RawEvent::Nothing => return None,
        };
        Some(ev)
    }
}

impl EventSource for LiveEvents<'_> {
    fn next_event(&mut self) -> Result<Option<Event>, Error> {
        if self.done {
            return Ok(None);
        }
        while let Some(item) = self.parser.next() {
            let (raw, span) = item.map_err(|err| scan_error(self.input, err))?;
            let location = location_from_span(&span);
            self.last_location = location;
            if let Some(ev) = self.translate(raw) {
                if ev.kind == EventKind::StreamEnd {
                    self.done = true;
                }
                return Ok(Some(ev.with_location(location)));
            }
        }
        self.done = true;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Flavor, is_null_literal};
    use crate::tags;

    fn collect(input: &str, options: &Options) -> Vec<Event> {
        let mut events = LiveEvents::new(input, options);
        let mut out = Vec::new();
        while let Some(ev) = events.next_event().unwrap() {
            out.push(ev);
        }
        out
    }

    fn kinds(events: &[Event]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn stream_and_document_markers_are_kept() {
        let events = collect("a: 1\n", &Options::default());
        assert_eq!(
            kinds(&events),
            [
                EventKind::StreamStart,
                EventKind::DocumentStart,
                EventKind::MappingStart,
                EventKind::Scalar,
                EventKind::Scalar,
                EventKind::MappingEnd,
                EventKind::DocumentEnd,
                EventKind::StreamEnd,
            ]
        );
        assert_eq!(events[1].document, Some(DocumentMeta::default()));
        assert_eq!(events[3].location, Location::new(1, 1));
    }

    #[test]
    fn missing_value_reads_as_null() {
        let events = collect("a:\nb: ''\n", &Options::default());
        assert!(is_null_literal(Flavor::Core, events[4].text()));
        assert_eq!(events[6].text(), Some(""));
        assert_eq!(events[6].style, ScalarStyle::SingleQuoted);
    }

    #[test]
    fn anchors_and_aliases_share_names() {
        let events = collect("- &x 1\n- *x\n", &Options::default());
        let anchor = events[3].anchor_name().map(str::to_string);
        assert!(anchor.is_some());
        assert_eq!(events[4].kind, EventKind::Alias);
        assert_eq!(events[4].text().map(str::to_string), anchor);
    }

    #[test]
    fn tags_are_canonical() {
        let events = collect("!!int 5\n", &Options::default());
        assert_eq!(events[2].tag.as_deref(), Some(tags::TAG_INT));
        assert!(!events[2].implicit);
    }

    #[test]
    fn options_set_document_metadata() {
        let options = crate::options! {
            version: Some(Version::V1_1),
            json: JsonMode::Force,
        };
        let events = collect("1\n", &options);
        assert_eq!(
            events[1].document,
            Some(DocumentMeta {
                version: Version::V1_1,
                json: true
            })
        );
    }

    #[test]
    fn scan_errors_carry_locations() {
        let mut events = LiveEvents::from_str("a: [1, 2\n");
        let err = loop {
            match events.next_event() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected a parse error"),
                Err(err) => break err,
            }
        };
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.location().is_some());
    }

    #[test]
    fn alias_names_are_read_back_from_the_line() {
        assert_eq!(alias_name_at("- *x\n- &x 1\n", 1, 3), Some("x".into()));
        assert_eq!(alias_name_at("[*first, 2]", 1, 1), Some("first".into()));
        assert_eq!(alias_name_at("a: 1", 1, 1), None);
        assert_eq!(alias_name_at("a: 1", 0, 1), None);
    }

    #[test]
    fn unknown_anchor_is_an_unresolved_alias() {
        let mut events = LiveEvents::from_str("- *x\n- &x 1\n");
        let err = loop {
            match events.next_event() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected an alias error"),
                Err(err) => break err,
            }
        };
        match err {
            Error::UnresolvedAlias { anchor, location, .. } => {
                assert_eq!(anchor, "x");
                assert_eq!(location.line(), 1);
            }
            other => panic!("expected an unresolved alias, got {other:?}"),
        }
    }
}
