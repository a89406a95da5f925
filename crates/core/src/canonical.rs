//! Canonical text form of plaintext transaction records.
//!
//! A record is encrypted from its canonical text, so two writers that agree
//! on a record must agree on these bytes. The format is JSON with:
//!
//! - object keys sorted by code point, regardless of how the map was built;
//! - `", "` between elements and `": "` between a key and its value;
//! - every character outside printable ASCII escaped as `\uXXXX`
//!   (surrogate pairs above the BMP);
//! - floats in shortest round-trip form with a mandatory fraction or
//!   exponent, e.g. `1.0`, `0.0001`, `1e-05`, `1e+16`.
//!
//! The layout is part of the ledger format: existing block files were
//! written from exactly this text and must keep decrypting to it.

use serde_json::{Number, Value};
use std::fmt::Write;

/// Render a JSON value in canonical form.
pub fn to_canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(out, key);
                out.push_str(": ");
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        let _ = write!(out, "{}", i);
    } else if let Some(u) = n.as_u64() {
        let _ = write!(out, "{}", u);
    } else if let Some(f) = n.as_f64() {
        out.push_str(&float_repr(f));
    } else {
        out.push_str(&n.to_string());
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
    out.push('"');
}

/// Render a float as the shortest text that round-trips, always showing a
/// fractional part or an exponent.
///
/// Values in `[1e-4, 1e16)` use positional notation (`1712345678.25`,
/// `3.0`); values outside use a signed, at least two-digit exponent
/// (`1e+16`, `2.5e-07`). Block hashes are computed over this text, so it
/// must not change.
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_owned();
    }

    let magnitude = value.abs();
    if (1e-4..1e16).contains(&magnitude) {
        let positional = value.to_string();
        if positional.contains('.') {
            positional
        } else {
            positional + ".0"
        }
    } else {
        let scientific = format!("{:e}", value);
        match scientific.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => scientific,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_genesis_record() {
        let record = json!({"info": "Genesis Block"});
        assert_eq!(to_canonical_string(&record), r#"{"info": "Genesis Block"}"#);
    }

    #[test]
    fn test_keys_sorted() {
        let record = json!({"zeta": 1, "alpha": 2, "mid": {"b": true, "a": null}});
        assert_eq!(
            to_canonical_string(&record),
            r#"{"alpha": 2, "mid": {"a": null, "b": true}, "zeta": 1}"#
        );
    }

    #[test]
    fn test_arrays_and_numbers() {
        let record = json!({"x": 1, "list": [1, -2, 3.5, "s"], "big": u64::MAX});
        assert_eq!(
            to_canonical_string(&record),
            r#"{"big": 18446744073709551615, "list": [1, -2, 3.5, "s"], "x": 1}"#
        );
    }

    #[test]
    fn test_string_escapes() {
        let record = json!("quote\" back\\ nl\n tab\t bell\u{07}");
        assert_eq!(
            to_canonical_string(&record),
            r#""quote\" back\\ nl\n tab\t bell\u0007""#
        );
    }

    #[test]
    fn test_non_ascii_escaped() {
        assert_eq!(to_canonical_string(&json!("café")), r#""caf\u00e9""#);
        assert_eq!(to_canonical_string(&json!("\u{7f}")), r#""\u007f""#);
        assert_eq!(to_canonical_string(&json!("\u{1f600}")), r#""\ud83d\ude00""#);
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(to_canonical_string(&json!({})), "{}");
        assert_eq!(to_canonical_string(&json!([])), "[]");
        assert_eq!(to_canonical_string(&json!({"a": []})), r#"{"a": []}"#);
    }

    #[test]
    fn test_float_repr_positional() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(-2.5), "-2.5");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(1712345678.123456), "1712345678.123456");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_float_repr_exponent() {
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1.5e-5), "1.5e-05");
        assert_eq!(float_repr(2.5e-7), "2.5e-07");
        assert_eq!(float_repr(-1.25e100), "-1.25e+100");
    }

    #[test]
    fn test_float_repr_special() {
        assert_eq!(float_repr(0.0), "0.0");
        assert_eq!(float_repr(-0.0), "-0.0");
        assert_eq!(float_repr(f64::INFINITY), "inf");
        assert_eq!(float_repr(f64::NAN), "nan");
    }
}
