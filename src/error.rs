//! Defines error and its location
use std::fmt;

use serde::{de, ser};

use crate::budget::BudgetBreach;
use crate::shape::Shape;

/// Row/column location within the source YAML document (1-indexed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-indexed row number in the input stream.
    pub(crate) row: u32,
    /// 1-indexed column number in the input stream.
    pub(crate) column: u32,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    ///
    /// Used for events built by hand and for errors raised outside any document.
    pub const UNKNOWN: Self = Self { row: 0, column: 0 };

    /// Create a new location record.
    ///
    /// Arguments:
    /// - `row`: 1-indexed row.
    /// - `column`: 1-indexed column.
    ///
    /// Called by:
    /// - The live event adapter when converting parser spans.
    /// - Applications that build `Event`s by hand and want diagnostics.
    pub const fn new(row: usize, column: usize) -> Self {
        Self {
            row: row as u32,
            column: column as u32,
        }
    }

    /// Line number, 1-indexed. Zero when unknown.
    pub fn line(&self) -> u64 {
        self.row as u64
    }

    /// Column number, 1-indexed. Zero when unknown.
    pub fn column(&self) -> u64 {
        self.column as u64
    }

    pub fn is_known(&self) -> bool {
        *self != Self::UNKNOWN
    }
}

/// Every failure the crate reports.
///
/// Binding errors carry the textual path of the node being bound (`/a/0/b`) and the
/// location of the event that triggered them.
#[derive(Debug)]
pub enum Error {
    /// A schema name or alias is already registered.
    DuplicateName { name: String },
    /// No schema with this name is registered.
    SchemaNotFound { name: String },
    /// Neither the requested schema nor the `failsafe` fallback is registered.
    NoSchemaAvailable { requested: String },
    /// No tag handler can be found for the event and target.
    CannotInferType {
        path: String,
        event: &'static str,
        target: Shape,
        location: Location,
    },
    /// The tag handler cannot bind into the declared target shape.
    TargetKindMismatch {
        path: String,
        tag: String,
        target: Shape,
        location: Location,
    },
    /// Scalar text is not a valid literal for the handler that owns it.
    InvalidScalarLiteral {
        path: String,
        tag: String,
        text: String,
        location: Location,
    },
    /// Integer text does not fit the target precision.
    NumericOverflow {
        path: String,
        text: String,
        target: Shape,
        location: Location,
    },
    /// A mapping key, or a record field, is bound twice.
    DuplicateKey {
        path: String,
        key: String,
        location: Location,
    },
    /// A record has no field matching this key.
    UnknownField {
        path: String,
        key: String,
        record: &'static str,
        location: Location,
    },
    /// An alias points at an anchor bound into a slot of a different shape.
    AliasTypeMismatch {
        path: String,
        anchor: String,
        expected: Shape,
        found: Shape,
        location: Location,
    },
    /// An alias names an anchor that has not been closed yet.
    UnresolvedAlias {
        path: String,
        anchor: String,
        location: Location,
    },
    /// The caller's root slot cannot receive the document.
    InvalidRootTarget { target: Shape, reason: String },
    /// The event sequence violates the nesting contract of the event source.
    Structure { msg: String, location: Location },
    /// Scanner / grammar error raised by the parser.
    Parse { msg: String, location: Location },
    /// A resource budget was exceeded.
    Budget {
        breach: BudgetBreach,
        location: Location,
    },
    /// Free-form error with optional source location.
    Message { msg: String, location: Location },
}

impl Error {
    /// Construct a `Message` error with no known location.
    pub(crate) fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message {
            msg: s.into(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn structure<S: Into<String>>(s: S) -> Self {
        Error::Structure {
            msg: s.into(),
            location: Location::UNKNOWN,
        }
    }

    #[cfg(feature = "deserialize")]
    pub(crate) fn from_scan_error(err: saphyr_parser::ScanError) -> Self {
        let mark = err.marker();
        Error::Parse {
            msg: err.info().to_owned(),
            location: Location::new(mark.line(), mark.col() + 1),
        }
    }

    /// Attach/override a concrete location, if the variant carries one.
    ///
    /// Called by:
    /// - The decoder loop, once per failing event, so handlers do not need to know
    ///   where the event came from.
    pub(crate) fn with_location(mut self, loc: Location) -> Self {
        if let Some(slot) = self.location_mut() {
            if !slot.is_known() {
                *slot = loc;
            }
        }
        self
    }

    /// Location carried by this error, if any.
    pub fn location(&self) -> Option<Location> {
        let loc = match self {
            Error::CannotInferType { location, .. }
            | Error::TargetKindMismatch { location, .. }
            | Error::InvalidScalarLiteral { location, .. }
            | Error::NumericOverflow { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::UnknownField { location, .. }
            | Error::AliasTypeMismatch { location, .. }
            | Error::UnresolvedAlias { location, .. }
            | Error::Structure { location, .. }
            | Error::Parse { location, .. }
            | Error::Budget { location, .. }
            | Error::Message { location, .. } => *location,
            Error::DuplicateName { .. }
            | Error::SchemaNotFound { .. }
            | Error::NoSchemaAvailable { .. }
            | Error::InvalidRootTarget { .. } => return None,
        };
        loc.is_known().then_some(loc)
    }

    /// Document path of the node that failed to bind, when the error came from the engine.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::CannotInferType { path, .. }
            | Error::TargetKindMismatch { path, .. }
            | Error::InvalidScalarLiteral { path, .. }
            | Error::NumericOverflow { path, .. }
            | Error::DuplicateKey { path, .. }
            | Error::UnknownField { path, .. }
            | Error::AliasTypeMismatch { path, .. }
            | Error::UnresolvedAlias { path, .. } => Some(path),
            _ => None,
        }
    }

    fn location_mut(&mut self) -> Option<&mut Location> {
        match self {
            Error::CannotInferType { location, .. }
            | Error::TargetKindMismatch { location, .. }
            | Error::InvalidScalarLiteral { location, .. }
            | Error::NumericOverflow { location, .. }
            | Error::DuplicateKey { location, .. }
            | Error::UnknownField { location, .. }
            | Error::AliasTypeMismatch { location, .. }
            | Error::UnresolvedAlias { location, .. }
            | Error::Structure { location, .. }
            | Error::Parse { location, .. }
            | Error::Budget { location, .. }
            | Error::Message { location, .. } => Some(location),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateName { name } => {
                write!(f, "schema name '{name}' is already registered")
            }
            Error::SchemaNotFound { name } => write!(f, "schema '{name}' is not registered"),
            Error::NoSchemaAvailable { requested } => write!(
                f,
                "schema '{requested}' is not registered and no failsafe schema is available"
            ),
            Error::CannotInferType {
                path,
                event,
                target,
                location,
            } => fmt_with_location(
                f,
                &format!("{path}: cannot infer tag for {event} bound into {target}"),
                location,
            ),
            Error::TargetKindMismatch {
                path,
                tag,
                target,
                location,
            } => fmt_with_location(
                f,
                &format!("{path}: {tag} cannot be bound into {target}"),
                location,
            ),
            Error::InvalidScalarLiteral {
                path,
                tag,
                text,
                location,
            } => fmt_with_location(
                f,
                &format!("{path}: '{text}' is not a valid {tag} literal"),
                location,
            ),
            Error::NumericOverflow {
                path,
                text,
                target,
                location,
            } => fmt_with_location(
                f,
                &format!("{path}: {text} overflows {target}"),
                location,
            ),
            Error::DuplicateKey {
                path,
                key,
                location,
            } => fmt_with_location(f, &format!("{path}: duplicate key '{key}'"), location),
            Error::UnknownField {
                path,
                key,
                record,
                location,
            } => fmt_with_location(
                f,
                &format!("{path}: unknown field '{key}' for {record}"),
                location,
            ),
            Error::AliasTypeMismatch {
                path,
                anchor,
                expected,
                found,
                location,
            } => fmt_with_location(
                f,
                &format!(
                    "{path}: alias *{anchor} has mismatched types: slot is {expected}, anchor is {found}"
                ),
                location,
            ),
            Error::UnresolvedAlias {
                path,
                anchor,
                location,
            } => fmt_with_location(
                f,
                &format!("{path}: cannot resolve alias *{anchor}"),
                location,
            ),
            Error::InvalidRootTarget { target, reason } => {
                write!(f, "illegal root target {target}: {reason}")
            }
            Error::Structure { msg, location } => {
                fmt_with_location(f, &format!("malformed event stream: {msg}"), location)
            }
            Error::Parse { msg, location } => fmt_with_location(f, msg, location),
            Error::Budget { breach, location } => {
                fmt_with_location(f, &format!("YAML budget breached: {breach:?}"), location)
            }
            Error::Message { msg, location } => fmt_with_location(f, msg, location),
        }
    }
}

impl std::error::Error for Error {}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::msg(msg.to_string())
    }
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::msg(msg.to_string())
    }
}

/// Print a message optionally suffixed with "at line X, column Y".
fn fmt_with_location(f: &mut fmt::Formatter<'_>, msg: &str, location: &Location) -> fmt::Result {
    if location.is_known() {
        write!(
            f,
            "{msg} at line {}, column {}",
            location.row, location.column
        )
    } else {
        write!(f, "{msg}")
    }
}

/// Convert a budget breach report into a user-facing error.
///
/// Called by:
/// - The decoder loop when the enforcer rejects an event.
pub(crate) fn budget_error(breach: BudgetBreach) -> Error {
    Error::Budget {
        breach,
        location: Location::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_appended_when_known() {
        let err = Error::DuplicateKey {
            path: "/a".to_string(),
            key: "a".to_string(),
            location: Location::UNKNOWN,
        }
        .with_location(Location::new(3, 7));
        assert_eq!(err.to_string(), "/a: duplicate key 'a' at line 3, column 7");
        assert_eq!(err.path(), Some("/a"));
    }

    #[test]
    fn with_location_keeps_the_first_known_location() {
        let err = Error::Structure {
            msg: "x".into(),
            location: Location::new(1, 1),
        }
        .with_location(Location::new(9, 9));
        assert_eq!(err.location(), Some(Location::new(1, 1)));
    }

    #[test]
    fn registry_errors_have_no_location() {
        let err = Error::DuplicateName {
            name: "core".into(),
        }
        .with_location(Location::new(2, 2));
        assert!(err.location().is_none());
    }
}
