//! Float text for emitted scalars. zmij gives the shortest round-trip form but may render
//! `4e-6` or `5`; YAML floats need a fractional part (`4.0e-6`, `5.0`).

use num_traits::float::FloatCore;
use zmij::Float;

/// Append the YAML text of `f`, using `.nan`, `.inf` and `-.inf` for the specials.
pub(crate) fn push_float_string<F: Float + FloatCore>(target: &mut String, f: F) {
    if f.is_nan() {
        target.push_str(".nan");
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            target.push_str(".inf");
        } else {
            target.push_str("-.inf");
        }
    } else {
        let mut buf = zmij::Buffer::new();
        let s = buf.format_finite(f);
        if s.as_bytes().contains(&b'.') {
            target.push_str(s);
        } else if let Some(exp_pos) = s.find(['e', 'E']) {
            target.push_str(&s[..exp_pos]);
            target.push_str(".0");
            target.push_str(&s[exp_pos..]);
        } else {
            target.push_str(s);
            target.push_str(".0");
        }
    }
}

pub(crate) fn float_string<F: Float + FloatCore>(f: F) -> String {
    let mut out = String::new();
    push_float_string(&mut out, f);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_always_carry_a_fraction() {
        assert_eq!(float_string(5.0f64), "5.0");
        assert_eq!(float_string(2.5f32), "2.5");
        assert_eq!(float_string(f64::NEG_INFINITY), "-.inf");
        assert_eq!(float_string(f64::NAN), ".nan");
        let tiny = float_string(4e-6f64);
        assert!(tiny.contains('.'), "{tiny}");
        assert_eq!(tiny.parse::<f64>().unwrap(), 4e-6);
    }
}
