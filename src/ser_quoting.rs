//! Scalar style for emitted strings.

use crate::schema::{Flavor, Resolved, implicit_resolve};

/// Returns true if `s` can be emitted as a plain scalar and read back as the same string.
///
/// Text that a YAML 1.2 core or a YAML 1.1 reader would type as null, bool, int or float
/// must be quoted, as must text a plain scalar cannot carry (indicators, comments,
/// surrounding whitespace, control characters).
#[inline]
pub(crate) fn is_plain_safe(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    if implicit_resolve(Flavor::Core, Some(s)) != Resolved::Str
        || implicit_resolve(Flavor::V1_1, Some(s)) != Resolved::Str
    {
        return false;
    }
    let bytes = s.as_bytes();
    if bytes[0].is_ascii_whitespace()
        || bytes[bytes.len() - 1].is_ascii_whitespace()
        || matches!(
            bytes[0],
            b'-' | b'?'
                | b':'
                | b','
                | b'['
                | b']'
                | b'{'
                | b'}'
                | b'#'
                | b'&'
                | b'*'
                | b'!'
                | b'|'
                | b'>'
                | b'\''
                | b'"'
                | b'%'
                | b'@'
                | b'`'
        )
    {
        return false;
    }
    if s.contains(": ") || s.contains(" #") || s.ends_with(':') {
        return false;
    }
    !s.chars().any(char::is_control)
}
