//! The `numbers` namespace: signed integer renderings in binary, hex, and
//! arbitrary radix 2..=36, with the matching parsers.

use super::common::*;
use crate::error::{Error, Result};
use crate::value::{render_num, Value};

/// Usage: toBinary(-2) -> "-10"
pub fn to_binary(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(render_radix(as_int(&args[0])?, 2)))
}

/// Usage: toHex(26) -> "1a"
pub fn to_hex(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(render_radix(as_int(&args[0])?, 16)))
}

/// Usage: toRadixNumber(104, 2) -> "1101000"
pub fn to_radix_number(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let n = as_int(&args[0])?;
    let radix = radix_arg(&args[1])?;
    Ok(Value::string(render_radix(n, radix)))
}

/// A binary argument may be a number or string whose digits are all 0/1;
/// anything else is rejected with its kind name.
/// Usage: fromBinary("1101000") -> 104
pub fn from_binary(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let digits = digits_arg(&args[0], "Binary")?;
    if digits.trim_start_matches('-').contains(|c| c != '0' && c != '1') {
        return Err(reject(&args[0], "Binary"));
    }
    parse_radix(&digits, 2, &args[0], "Binary")
}

/// Usage: fromHex("1a") -> 26
pub fn from_hex(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let digits = digits_arg(&args[0], "Hexadecimal")?;
    parse_radix(&digits, 16, &args[0], "Hexadecimal")
}

/// Usage: fromRadixNumber("1101000", 2) -> 104
pub fn from_radix_number(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let digits = digits_arg(&args[0], "Number")?;
    let radix = radix_arg(&args[1])?;
    parse_radix(&digits, radix, &args[0], "Number")
}

fn radix_arg(value: &Value) -> Result<u32> {
    let radix = as_int(value)?;
    if !(2..=36).contains(&radix) {
        return Err(Error::Domain(format!("Invalid radix: {}", radix)));
    }
    Ok(radix as u32)
}

/// A numeric argument contributes its decimal rendering as the digit
/// string, so `fromBinary(1101000)` and `fromBinary("1101000")` agree.
fn digits_arg(value: &Value, kind: &str) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        Value::Num(n) => {
            if !crate::value::num_is_integer(*n) {
                return Err(reject(value, kind));
            }
            Ok(render_num(*n))
        }
        _ => Err(reject(value, kind)),
    }
}

fn reject(value: &Value, kind: &str) -> Error {
    let mut actual = value.pretty_name().to_string();
    if let Some(first) = actual.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    Error::type_mismatch(kind, actual)
}

fn render_radix(n: i64, radix: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let negative = n < 0;
    let mut magnitude = n.unsigned_abs();
    let mut digits = Vec::new();
    while magnitude > 0 {
        let digit = (magnitude % radix as u64) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap());
        magnitude /= radix as u64;
    }
    if negative {
        digits.push('-');
    }
    digits.into_iter().rev().collect()
}

fn parse_radix(digits: &str, radix: u32, original: &Value, kind: &str) -> Result<Value> {
    let (negative, magnitude) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, digits),
    };
    let parsed = i64::from_str_radix(magnitude, radix).map_err(|_| reject(original, kind))?;
    Ok(Value::Num(if negative {
        -(parsed as f64)
    } else {
        parsed as f64
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Num(n)
    }

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    #[test]
    fn test_radix_golden_scenarios() {
        assert_eq!(from_radix_number(&[s("1101000"), num(2.0)]).unwrap(), num(104.0));
        assert_eq!(to_radix_number(&[num(104.0), num(2.0)]).unwrap(), s("1101000"));
    }

    #[test]
    fn test_binary_round_trip() {
        for n in [-300i64, -2, -1, 0, 1, 5, 104, 65535] {
            let rendered = to_binary(&[num(n as f64)]).unwrap();
            assert_eq!(from_binary(&[rendered]).unwrap(), num(n as f64));
        }
    }

    #[test]
    fn test_hex_round_trip() {
        for n in [-255i64, 0, 26, 4096] {
            let rendered = to_hex(&[num(n as f64)]).unwrap();
            assert_eq!(from_hex(&[rendered]).unwrap(), num(n as f64));
        }
        assert_eq!(to_hex(&[num(26.0)]).unwrap(), s("1a"));
    }

    #[test]
    fn test_negative_renders_sign_then_magnitude() {
        assert_eq!(to_binary(&[num(-2.0)]).unwrap(), s("-10"));
        assert_eq!(to_radix_number(&[num(-104.0), num(2.0)]).unwrap(), s("-1101000"));
    }

    #[test]
    fn test_from_binary_rejects_non_binary_number() {
        let err = from_binary(&[num(123.0)]).unwrap_err();
        assert_eq!(err.to_string(), "Expected Binary, got: Number");
        // a number whose decimal rendering is all 0/1 digits is accepted
        assert_eq!(from_binary(&[num(1101000.0)]).unwrap(), num(104.0));
    }

    #[test]
    fn test_from_hex_rejects_bad_digits() {
        let err = from_hex(&[s("xyz")]).unwrap_err();
        assert_eq!(err.to_string(), "Expected Hexadecimal, got: String");
        let err = from_hex(&[Value::Bool(true)]).unwrap_err();
        assert_eq!(err.to_string(), "Expected Hexadecimal, got: Boolean");
    }

    #[test]
    fn test_radix_range_validation() {
        assert!(to_radix_number(&[num(1.0), num(1.0)]).is_err());
        assert!(to_radix_number(&[num(1.0), num(37.0)]).is_err());
        assert_eq!(to_radix_number(&[num(35.0), num(36.0)]).unwrap(), s("z"));
        assert_eq!(from_radix_number(&[s("z"), num(36.0)]).unwrap(), num(35.0));
    }
}
