//! Number parsing for the int and float tag handlers.
//!
//! Integers are parsed by hand so that syntax errors and range errors stay distinct:
//! the int handler reports them as different error kinds.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IntError {
    /// Not a number in the requested base.
    Invalid,
    /// Well-formed, but out of range for the requested precision.
    Overflow,
}

/// Split an optional `0o` / `0x` prefix off integer text.
///
/// Returns the remaining digits and the radix they are written in.
pub(crate) fn split_radix(text: &str) -> (&str, u32) {
    if let Some(rest) = text.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = text.strip_prefix("0o") {
        (rest, 8)
    } else {
        (text, 10)
    }
}

/// Accumulate unsigned digits in `radix`.
///
/// Arguments:
/// - `digits`: digits only, no sign, no prefix, no separators.
/// - `radix`: 8, 10 or 16.
///
/// Returns:
/// - The magnitude, `Invalid` on an empty string or a foreign digit, `Overflow` past `u128`.
fn parse_digits_u128(digits: &str, radix: u32) -> Result<u128, IntError> {
    if digits.is_empty() {
        return Err(IntError::Invalid);
    }
    let mut val: u128 = 0;
    let mut overflow = false;
    for c in digits.chars() {
        let d = c.to_digit(radix).ok_or(IntError::Invalid)?;
        match val.checked_mul(radix as u128).and_then(|v| v.checked_add(d as u128)) {
            Some(v) => val = v,
            // Keep scanning: a bad digit later on is still a syntax error.
            None => overflow = true,
        }
    }
    if overflow {
        Err(IntError::Overflow)
    } else {
        Ok(val)
    }
}

/// Parse signed decimal text (`-12`, `+7`) into `bits` of precision.
pub(crate) fn parse_signed(text: &str, bits: u32) -> Result<i64, IntError> {
    let (neg, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = parse_digits_u128(digits, 10)?;
    let max = (1i128 << (bits - 1)) - 1;
    let min = -(1i128 << (bits - 1));
    let magnitude = i128::try_from(magnitude).map_err(|_| IntError::Overflow)?;
    let value = if neg { -magnitude } else { magnitude };
    if value < min || value > max {
        return Err(IntError::Overflow);
    }
    i64::try_from(value).map_err(|_| IntError::Overflow)
}

/// Parse unsigned digits in `radix` into `bits` of precision. Signs are rejected.
pub(crate) fn parse_unsigned(digits: &str, radix: u32, bits: u32) -> Result<u64, IntError> {
    let value = parse_digits_u128(digits, radix)?;
    let max = (1u128 << bits) - 1;
    if value > max {
        return Err(IntError::Overflow);
    }
    u64::try_from(value).map_err(|_| IntError::Overflow)
}

/// The `.inf` / `.nan` family, in any of the cases YAML permits.
fn special_float(text: &str) -> Option<f64> {
    match text {
        ".nan" | ".NaN" | ".NAN" => Some(f64::NAN),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

pub(crate) fn parse_f64(text: &str) -> Option<f64> {
    if let Some(v) = special_float(text) {
        return Some(v);
    }
    text.parse::<f64>().ok()
}

pub(crate) fn parse_f32(text: &str) -> Option<f32> {
    if let Some(v) = special_float(text) {
        return Some(v as f32);
    }
    text.parse::<f32>().ok()
}
