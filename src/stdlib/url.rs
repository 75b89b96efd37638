//! The `url` namespace: application/x-www-form-urlencoded encoding, where
//! spaces travel as `+` and `-_.*` stay literal.

use super::common::*;
use crate::error::{Error, Result};
use crate::value::Value;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything non-alphanumeric except `-`, `_`, `.`, `*`; space is handled
/// separately so it can become `+`.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*')
    .remove(b' ');

/// Usage: encode("Hello World") -> "Hello+World"
pub fn encode(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let data = as_str(&args[0])?;
    let encoded = utf8_percent_encode(data, FORM).to_string();
    Ok(Value::string(encoded.replace(' ', "+")))
}

/// Usage: decode("Hello+World%21") -> "Hello World!"
pub fn decode(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let data = as_str(&args[0])?.replace('+', " ");
    let decoded = percent_decode_str(&data)
        .decode_utf8()
        .map_err(|e| Error::Domain(format!("Could not decode url data: {}", e)))?;
    Ok(Value::string(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    #[test]
    fn test_encode_form_style() {
        assert_eq!(encode(&[s("Hello World")]).unwrap(), s("Hello+World"));
        assert_eq!(encode(&[s("a=b&c")]).unwrap(), s("a%3Db%26c"));
        assert_eq!(encode(&[s("safe-_.* chars")]).unwrap(), s("safe-_.*+chars"));
    }

    #[test]
    fn test_decode_reverses_encode() {
        for input in ["Hello World", "a=b&c", "ünïcode", "100% sure"] {
            let encoded = encode(&[s(input)]).unwrap();
            assert_eq!(decode(&[encoded]).unwrap(), s(input));
        }
    }

    #[test]
    fn test_decode_plus_and_percent() {
        assert_eq!(decode(&[s("Hello+World%21")]).unwrap(), s("Hello World!"));
    }
}
