//! Implicit typing of untagged plain scalars.
//!
//! Rules are ordered textual tests, first match wins. Every input text is classified;
//! anything no rule claims is a string.

/// Which YAML type-resolution profile a schema follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Strings, sequences and mappings only.
    Failsafe,
    Json,
    /// YAML 1.2 core schema.
    Core,
    V1_1,
    V1_3,
}

/// Semantic kind picked for an untagged scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolved {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

/// Longer texts are never considered numeric.
const MAX_NUMERIC_LEN: usize = 256;

/// Null literal forms accepted by a flavor. Absent text is null everywhere but failsafe.
pub fn is_null_literal(flavor: Flavor, text: Option<&str>) -> bool {
    match (flavor, text) {
        (Flavor::Failsafe, _) => false,
        (_, None) => true,
        (Flavor::Json, Some(t)) => t == "null",
        (_, Some(t)) => matches!(t, "" | "~" | "null" | "Null" | "NULL"),
    }
}

/// Boolean value of `text` under a flavor, if it is a boolean literal there.
pub fn bool_literal(flavor: Flavor, text: &str) -> Option<bool> {
    match flavor {
        Flavor::Failsafe => None,
        Flavor::Json => match text {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Flavor::Core | Flavor::V1_3 => core_bool(text),
        Flavor::V1_1 => core_bool(text).or_else(|| yaml11_bool(text)),
    }
}

fn core_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn yaml11_bool(text: &str) -> Option<bool> {
    match text {
        "y" | "Y" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => Some(true),
        "n" | "N" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => Some(false),
        _ => None,
    }
}

fn is_float_special(text: &str) -> bool {
    let unsigned = text
        .strip_prefix('+')
        .or_else(|| text.strip_prefix('-'))
        .unwrap_or(text);
    matches!(text, ".nan" | ".NaN" | ".NAN") || matches!(unsigned, ".inf" | ".Inf" | ".INF")
}

/// Classify an untagged plain scalar.
///
/// Arguments:
/// - `flavor`: profile of the active schema.
/// - `text`: scalar text, `None` when absent.
///
/// Called by:
/// - `YamlSchema::implicit_resolve` when a plain scalar lands in a generic slot.
pub fn implicit_resolve(flavor: Flavor, text: Option<&str>) -> Resolved {
    if flavor == Flavor::Failsafe {
        return Resolved::Str;
    }
    let Some(text) = text else {
        return Resolved::Null;
    };
    if is_null_literal(flavor, Some(text)) {
        return Resolved::Null;
    }
    if flavor == Flavor::Json && text.is_empty() {
        return Resolved::Str;
    }
    if bool_literal(flavor, text).is_some() {
        return Resolved::Bool;
    }
    if flavor != Flavor::Json && is_float_special(text) {
        return Resolved::Float;
    }
    scan_number(flavor == Flavor::Json, text)
}

fn scan_number(json: bool, text: &str) -> Resolved {
    if text == "0" {
        return Resolved::Int;
    }
    if text.len() > MAX_NUMERIC_LEN {
        return Resolved::Str;
    }

    if !json {
        let prefixed = text
            .strip_prefix("0x")
            .map(|d| (d, 16))
            .or_else(|| text.strip_prefix("0o").map(|d| (d, 8)));
        if let Some((digits, radix)) = prefixed {
            let all_digits = !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
            return if all_digits { Resolved::Int } else { Resolved::Str };
        }
    }

    let b = text.as_bytes();
    let len = b.len();
    let mut i = 0;

    match b.first() {
        Some(b'-') => i += 1,
        Some(b'+') if !json => i += 1,
        _ => {}
    }

    let int_start = i;
    if i < len && b[i] == b'0' {
        i += 1;
        // A lone zero takes no sign; `-0.5` is still a float.
        if int_start > 0 && i == len {
            return Resolved::Str;
        }
    } else if i < len && (b'1'..=b'9').contains(&b[i]) {
        while i < len && b[i].is_ascii_digit() {
            i += 1;
        }
    }
    let has_int = i > int_start;
    if has_int && i == len {
        return Resolved::Int;
    }
    if !has_int && (json || b.get(i) != Some(&b'.')) {
        return Resolved::Str;
    }

    if i < len && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < len && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return Resolved::Str;
        }
    }

    if i < len && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if i < len && (b[i] == b'+' || b[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < len && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return Resolved::Str;
        }
    }

    if i == len {
        Resolved::Float
    } else {
        Resolved::Str
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core(t: &str) -> Resolved {
        implicit_resolve(Flavor::Core, Some(t))
    }

    #[test]
    fn core_examples() {
        assert_eq!(core("0x1F"), Resolved::Int);
        assert_eq!(core(".NaN"), Resolved::Float);
        assert_eq!(core("Null"), Resolved::Null);
        assert_eq!(core("yes"), Resolved::Str);
        assert_eq!(core("~"), Resolved::Null);
        assert_eq!(core(""), Resolved::Null);
        assert_eq!(core("TRUE"), Resolved::Bool);
        assert_eq!(core("-.inf"), Resolved::Float);
        assert_eq!(core("+.INF"), Resolved::Float);
    }

    #[test]
    fn core_numbers() {
        assert_eq!(core("0"), Resolved::Int);
        assert_eq!(core("-0"), Resolved::Str);
        assert_eq!(core("+0"), Resolved::Str);
        assert_eq!(core("-0.5"), Resolved::Float);
        assert_eq!(core("+12"), Resolved::Int);
        assert_eq!(core("012"), Resolved::Str);
        assert_eq!(core("0o17"), Resolved::Int);
        assert_eq!(core("0o19"), Resolved::Str);
        assert_eq!(core("0x"), Resolved::Str);
        assert_eq!(core("1.5"), Resolved::Float);
        assert_eq!(core("0.5"), Resolved::Float);
        assert_eq!(core(".5"), Resolved::Float);
        assert_eq!(core("1e10"), Resolved::Float);
        assert_eq!(core("1.5E-3"), Resolved::Float);
        assert_eq!(core("1."), Resolved::Str);
        assert_eq!(core("1e"), Resolved::Str);
        assert_eq!(core("1x"), Resolved::Str);
        assert_eq!(core("-"), Resolved::Str);
        assert_eq!(core("1_000"), Resolved::Str);
    }

    #[test]
    fn long_numeric_text_is_a_string() {
        let long = "1".repeat(MAX_NUMERIC_LEN + 1);
        assert_eq!(core(&long), Resolved::Str);
        let fits = "1".repeat(MAX_NUMERIC_LEN);
        assert_eq!(core(&fits), Resolved::Int);
    }

    #[test]
    fn json_is_strict() {
        let json = |t: &str| implicit_resolve(Flavor::Json, Some(t));
        assert_eq!(json("null"), Resolved::Null);
        assert_eq!(json("Null"), Resolved::Str);
        assert_eq!(json(""), Resolved::Str);
        assert_eq!(json("True"), Resolved::Str);
        assert_eq!(json("true"), Resolved::Bool);
        assert_eq!(json("+1"), Resolved::Str);
        assert_eq!(json("-1"), Resolved::Int);
        assert_eq!(json("0x10"), Resolved::Str);
        assert_eq!(json(".5"), Resolved::Str);
        assert_eq!(json(".nan"), Resolved::Str);
        assert_eq!(json("-1.5e3"), Resolved::Float);
        assert_eq!(implicit_resolve(Flavor::Json, None), Resolved::Null);
    }

    #[test]
    fn yaml11_booleans() {
        for t in ["y", "Yes", "ON", "off", "N", "no"] {
            assert_eq!(implicit_resolve(Flavor::V1_1, Some(t)), Resolved::Bool, "{t}");
            assert_eq!(implicit_resolve(Flavor::V1_3, Some(t)), Resolved::Str, "{t}");
        }
        assert_eq!(bool_literal(Flavor::V1_1, "Off"), Some(false));
    }

    #[test]
    fn failsafe_is_always_string() {
        for t in [Some("1"), Some("true"), Some("~"), None] {
            assert_eq!(implicit_resolve(Flavor::Failsafe, t), Resolved::Str);
        }
    }
}
