//! The `binaries` namespace: base64 and hex byte transports plus the
//! line-oriented helpers.

use super::common::*;
use crate::error::{Error, Result};
use crate::value::Value;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Usage: toBase64("Hello") -> "SGVsbG8="
pub fn to_base64(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let data = coerce_scalar(&args[0])?;
    Ok(Value::string(STANDARD.encode(data.as_bytes())))
}

/// Usage: fromBase64("SGVsbG8=") -> "Hello"
pub fn from_base64(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let encoded = as_str(&args[0])?;
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| Error::Domain(format!("Could not decode base64: {}", e)))?;
    String::from_utf8(bytes)
        .map(Value::string)
        .map_err(|e| Error::Domain(format!("Decoded data is not UTF-8: {}", e)))
}

/// Usage: toHex("Hello") -> "48656c6c6f"
pub fn to_hex(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let data = coerce_scalar(&args[0])?;
    Ok(Value::string(hex_encode(data.as_bytes())))
}

/// Usage: fromHex("48656c6c6f") -> "Hello"
pub fn from_hex(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let encoded = as_str(&args[0])?;
    let bytes = hex_decode(encoded)?;
    String::from_utf8(bytes)
        .map(Value::string)
        .map_err(|e| Error::Domain(format!("Decoded data is not UTF-8: {}", e)))
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

fn hex_decode(s: &str) -> Result<Vec<u8>> {
    if s.len() % 2 != 0 {
        return Err(Error::Domain(format!("Could not decode hex: {}", s)));
    }
    (0..s.len())
        .step_by(2)
        .map(|index| {
            u8::from_str_radix(&s[index..index + 2], 16)
                .map_err(|_| Error::Domain(format!("Could not decode hex: {}", s)))
        })
        .collect()
}

/// Split a document body into lines. Only the UTF-8 charset is built in.
/// Usage: readLinesWith("a\nb\n", "UTF-8") -> ["a", "b"]
pub fn read_lines_with(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let data = as_str(&args[0])?;
    check_charset(as_str(&args[1])?)?;
    Ok(Value::array(data.lines().map(Value::string).collect()))
}

/// Join lines, terminating each with a newline.
/// Usage: writeLinesWith(["a", "b"], "UTF-8") -> "a\nb\n"
pub fn write_lines_with(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let lines = as_arr(&args[0])?;
    check_charset(as_str(&args[1])?)?;
    let mut out = String::new();
    for line in lines.iter() {
        out.push_str(&coerce_scalar(&line.force()?)?);
        out.push('\n');
    }
    Ok(Value::string(out))
}

fn check_charset(name: &str) -> Result<()> {
    if name.eq_ignore_ascii_case("utf-8") || name.eq_ignore_ascii_case("utf8") {
        Ok(())
    } else {
        Err(Error::Domain(format!("Unsupported charset: {}", name)))
    }
}
