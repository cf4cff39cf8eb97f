//! Identifier coercion for ids that cross the JSON boundary as strings or numbers.
//! Malformed input degrades to `None`; nothing here panics.

use serde_json::Value;

/// Anything that can be read as a 64-bit record identifier
pub trait IdentifierSource {
    fn to_identifier(&self) -> Option<i64>;
}

impl IdentifierSource for i64 {
    fn to_identifier(&self) -> Option<i64> {
        Some(*self)
    }
}

impl IdentifierSource for i32 {
    fn to_identifier(&self) -> Option<i64> {
        Some(i64::from(*self))
    }
}

impl IdentifierSource for u64 {
    fn to_identifier(&self) -> Option<i64> {
        i64::try_from(*self).ok()
    }
}

impl IdentifierSource for f64 {
    fn to_identifier(&self) -> Option<i64> {
        from_float(*self)
    }
}

impl IdentifierSource for str {
    fn to_identifier(&self) -> Option<i64> {
        parse_identifier(self)
    }
}

impl IdentifierSource for String {
    fn to_identifier(&self) -> Option<i64> {
        parse_identifier(self)
    }
}

impl IdentifierSource for Value {
    fn to_identifier(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
                .or_else(|| n.as_f64().and_then(from_float)),
            Value::String(s) => parse_identifier(s),
            _ => None,
        }
    }
}

impl<T: IdentifierSource> IdentifierSource for Option<T> {
    fn to_identifier(&self) -> Option<i64> {
        self.as_ref().and_then(IdentifierSource::to_identifier)
    }
}

impl<T: IdentifierSource + ?Sized> IdentifierSource for &T {
    fn to_identifier(&self) -> Option<i64> {
        (**self).to_identifier()
    }
}

/// Coerce a raw identifier, yielding `None` for anything that is not an exact integer
pub fn to_id_or_null<T: IdentifierSource + ?Sized>(value: &T) -> Option<i64> {
    value.to_identifier()
}

/// Same as [`to_id_or_null`] but substitutes `fallback` when coercion fails
pub fn to_id_safe<T: IdentifierSource + ?Sized>(value: &T, fallback: Option<i64>) -> Option<i64> {
    value.to_identifier().or(fallback)
}

// 2^63 is exactly representable as f64; i64::MAX is not.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn from_float(v: f64) -> Option<i64> {
    if !v.is_finite() || v.fract() != 0.0 || v < -I64_BOUND || v >= I64_BOUND {
        return None;
    }
    Some(v as i64)
}

fn parse_identifier(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("undefined")
    {
        return None;
    }

    // Radix prefixes are unsigned only
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            return i64::from_str_radix(digits, radix).ok();
        }
    }

    let unsigned = trimmed.strip_prefix(&['-', '+'][..]).unwrap_or(trimmed);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_integers_survive_stringification() {
        for n in [0_i64, 1, -1, 42, 1_000_000_007, i64::MAX, i64::MIN] {
            let once = to_id_or_null(&n.to_string());
            assert_eq!(once, Some(n));
            let twice = to_id_or_null(&once.unwrap().to_string());
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn blank_and_sentinel_strings_are_null() {
        for raw in ["", "   ", "null", "NULL", " Undefined ", "undefined"] {
            assert_eq!(to_id_or_null(raw), None, "expected None for {:?}", raw);
        }
    }

    #[test]
    fn non_numeric_input_is_null() {
        assert_eq!(to_id_or_null("abc"), None);
        assert_eq!(to_id_or_null("12abc"), None);
        assert_eq!(to_id_or_null("1.5"), None);
        assert_eq!(to_id_or_null("1e3"), None);
        assert_eq!(to_id_or_null("-0x10"), None);
        assert_eq!(to_id_or_null("99999999999999999999"), None);
        assert_eq!(to_id_or_null(&json!({})), None);
        assert_eq!(to_id_or_null(&json!([1])), None);
        assert_eq!(to_id_or_null(&json!(true)), None);
        assert_eq!(to_id_or_null(&Value::Null), None);
        assert_eq!(to_id_or_null(&None::<i64>), None);
    }

    #[test]
    fn numbers_convert_exactly() {
        assert_eq!(to_id_or_null(&json!(7)), Some(7));
        assert_eq!(to_id_or_null(&json!(7.0)), Some(7));
        assert_eq!(to_id_or_null(&json!(7.25)), None);
        assert_eq!(to_id_or_null(&f64::NAN), None);
        assert_eq!(to_id_or_null(&u64::MAX), None);
        assert_eq!(to_id_or_null(&json!(u64::MAX)), None);
        assert_eq!(to_id_or_null(&12_i32), Some(12));
    }

    #[test]
    fn strings_are_trimmed_and_prefixed_radixes_parse() {
        assert_eq!(to_id_or_null(" 17 "), Some(17));
        assert_eq!(to_id_or_null("+5"), Some(5));
        assert_eq!(to_id_or_null("-5"), Some(-5));
        assert_eq!(to_id_or_null("0x1F"), Some(31));
        assert_eq!(to_id_or_null("0b101"), Some(5));
        assert_eq!(to_id_or_null("0o17"), Some(15));
        assert_eq!(to_id_or_null("0x"), None);
        assert_eq!(to_id_or_null(&json!("42")), Some(42));
    }

    #[test]
    fn safe_variant_uses_fallback() {
        assert_eq!(to_id_safe("nope", Some(9)), Some(9));
        assert_eq!(to_id_safe("3", Some(9)), Some(3));
        assert_eq!(to_id_safe(&Value::Null, None), None);
    }
}
