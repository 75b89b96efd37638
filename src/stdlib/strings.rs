//! The `strings` namespace: case pipeline, pads, wraps, substring family,
//! character classification, and the small English inflection heuristics.

use super::common::*;
use crate::error::{Error, Result};
use crate::value::{render_num, Value};

/// Split on runs of `[_\s-]+` and on lowercase-to-uppercase transitions.
/// Every case transformation shares this tokenizer.
fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        } else {
            if prev_lower && c.is_uppercase() && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            prev_lower = c.is_lowercase();
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn capitalize_token(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Usage: camelize("customer_first-name") -> "customerFirstName"
pub fn camelize(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let tokens = tokenize(as_str(&args[0])?);
    let mut out = String::new();
    for (index, token) in tokens.iter().enumerate() {
        if index == 0 {
            out.push_str(&token.to_lowercase());
        } else {
            out.push_str(&capitalize_token(token));
        }
    }
    Ok(Value::string(out))
}

/// Title Case with single spaces.
/// Usage: capitalize("customer_first_name") -> "Customer First Name"
pub fn capitalize(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let tokens = tokenize(as_str(&args[0])?);
    let capitalized: Vec<String> = tokens.iter().map(|t| capitalize_token(t)).collect();
    Ok(Value::string(capitalized.join(" ")))
}

/// Usage: dasherize("customerFirstName") -> "customer-first-name"
pub fn dasherize(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let tokens = tokenize(as_str(&args[0])?);
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    Ok(Value::string(lowered.join("-")))
}

/// Usage: underscore("customerFirstName") -> "customer_first_name"
pub fn underscore(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let tokens = tokenize(as_str(&args[0])?);
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    Ok(Value::string(lowered.join("_")))
}

/// Usage: appendIfMissing("file", ".txt") -> "file.txt"
pub fn append_if_missing(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let suffix = as_str(&args[1])?;
    if s.ends_with(suffix) {
        Ok(args[0].clone())
    } else {
        Ok(Value::string(format!("{}{}", s, suffix)))
    }
}

/// Usage: prependIfMissing("example.com", "https://") -> "https://example.com"
pub fn prepend_if_missing(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let prefix = as_str(&args[1])?;
    if s.starts_with(prefix) {
        Ok(args[0].clone())
    } else {
        Ok(Value::string(format!("{}{}", prefix, s)))
    }
}

/// Usage: charCode("Master") -> 77
pub fn char_code(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let s = as_str(&args[0])?;
    match s.chars().next() {
        Some(c) => Ok(Value::Num(c as u32 as f64)),
        None => Err(Error::Domain("Expected a non-empty string".to_string())),
    }
}

/// Usage: charCodeAt("Master", 1) -> 97
pub fn char_code_at(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let index = as_int(&args[1])?;
    if index < 0 {
        return Err(Error::Domain(format!("Invalid index: {}", index)));
    }
    match s.chars().nth(index as usize) {
        Some(c) => Ok(Value::Num(c as u32 as f64)),
        None => Err(Error::Domain(format!(
            "Index {} out of bounds for length {}",
            index,
            s.chars().count()
        ))),
    }
}

/// Usage: fromCharCode(77) -> "M"
pub fn from_char_code(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let code = as_int(&args[0])?;
    let c = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| Error::Domain(format!("Invalid character code: {}", code)))?;
    Ok(Value::string(c.to_string()))
}

/// Coerce the scalar argument for the character-class predicates; null has
/// no rendering and short-circuits to false at each call site.
fn classify_input(value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Str(s) => Ok(Some(s.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Num(n) => Ok(Some(render_num(*n))),
        other => Err(Error::type_mismatch(
            "String, Number, Boolean, or Null",
            other.pretty_name(),
        )),
    }
}

/// Usage: isAlpha("abc") -> true; isAlpha(null) -> false
pub fn is_alpha(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(match classify_input(&args[0])? {
        Some(s) => !s.is_empty() && s.chars().all(char::is_alphabetic),
        None => false,
    }))
}

/// Usage: isAlphanumeric("a1b2") -> true
pub fn is_alphanumeric(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(match classify_input(&args[0])? {
        Some(s) => !s.is_empty() && s.chars().all(char::is_alphanumeric),
        None => false,
    }))
}

/// Usage: isNumeric("123") -> true
pub fn is_numeric(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(match classify_input(&args[0])? {
        Some(s) => !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }))
}

/// Usage: isLowerCase("hello") -> true; isLowerCase(true) -> true
pub fn is_lower_case(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(match classify_input(&args[0])? {
        Some(s) => !s.is_empty() && s.chars().all(|c| c.is_alphabetic() && c.is_lowercase()),
        None => false,
    }))
}

/// Usage: isUpperCase("HELLO") -> true
pub fn is_upper_case(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(match classify_input(&args[0])? {
        Some(s) => !s.is_empty() && s.chars().all(|c| c.is_alphabetic() && c.is_uppercase()),
        None => false,
    }))
}

/// Usage: isWhitespace("  ") -> true; isWhitespace(null) -> false
pub fn is_whitespace(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(match classify_input(&args[0])? {
        Some(s) => s.chars().all(char::is_whitespace),
        None => false,
    }))
}

/// Pad with spaces on the left to the requested size.
/// Usage: leftPad("1", 3) -> "  1"
pub fn left_pad(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = pad_input(&args[0])?;
    let size = as_int(&args[1])?.max(0) as usize;
    let length = s.chars().count();
    if length >= size {
        return Ok(Value::string(s));
    }
    Ok(Value::string(format!(
        "{}{}",
        " ".repeat(size - length),
        s
    )))
}

/// Usage: rightPad("1", 3) -> "1  "
pub fn right_pad(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = pad_input(&args[0])?;
    let size = as_int(&args[1])?.max(0) as usize;
    let length = s.chars().count();
    if length >= size {
        return Ok(Value::string(s));
    }
    Ok(Value::string(format!(
        "{}{}",
        s,
        " ".repeat(size - length)
    )))
}

fn pad_input(value: &Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        Value::Num(n) => Ok(render_num(*n)),
        other => Err(Error::type_mismatch("String or Number", other.pretty_name())),
    }
}

/// Teens take "th"; otherwise the last digit picks st/nd/rd/th.
/// Usage: ordinalize(21) -> "21st"; ordinalize(112) -> "112th"
pub fn ordinalize(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let n = as_int(&args[0])?;
    let suffix = match (n.abs() % 100, n.abs() % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    Ok(Value::string(format!("{}{}", n, suffix)))
}

/// Minimal English pluralization: y -> ies, x-endings take es, default +s.
/// Usage: pluralize("box") -> "boxes"; pluralize("day") -> "days"
pub fn pluralize(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let s = as_str(&args[0])?;
    if s.is_empty() {
        return Ok(args[0].clone());
    }
    let out = if let Some(stem) = s.strip_suffix('y') {
        let vowel_before = stem
            .chars()
            .last()
            .map(|c| "aeiouAEIOU".contains(c))
            .unwrap_or(false);
        if vowel_before {
            format!("{}s", s)
        } else {
            format!("{}ies", stem)
        }
    } else if s.ends_with('x') {
        format!("{}es", s)
    } else {
        format!("{}s", s)
    };
    Ok(Value::string(out))
}

/// Usage: singularize("boxes") -> "box"; singularize("stories") -> "story"
pub fn singularize(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let s = as_str(&args[0])?;
    let out = if let Some(stem) = s.strip_suffix("ies") {
        format!("{}y", stem)
    } else if let Some(stem) = s.strip_suffix("xes") {
        format!("{}x", stem)
    } else if let Some(stem) = s.strip_suffix('s') {
        stem.to_string()
    } else {
        s.to_string()
    };
    Ok(Value::string(out))
}

/// Usage: repeat("ab", 3) -> "ababab"
pub fn repeat(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let count = as_int(&args[1])?.max(0) as usize;
    Ok(Value::string(s.repeat(count)))
}

/// Everything after the first occurrence of the separator; no occurrence
/// yields the empty string. An empty separator matches at position zero, so
/// the result is the input minus its first character.
/// Usage: substringAfter("a-b-c", "-") -> "b-c"
pub fn substring_after(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let separator = as_str(&args[1])?;
    if separator.is_empty() {
        let mut chars = s.chars();
        chars.next();
        return Ok(Value::string(chars.as_str()));
    }
    match s.find(separator) {
        Some(index) => Ok(Value::string(&s[index + separator.len()..])),
        None => Ok(Value::string("")),
    }
}

/// Usage: substringAfterLast("a-b-c", "-") -> "c"
pub fn substring_after_last(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let separator = as_str(&args[1])?;
    if separator.is_empty() {
        return Ok(Value::string(""));
    }
    match s.rfind(separator) {
        Some(index) => Ok(Value::string(&s[index + separator.len()..])),
        None => Ok(Value::string("")),
    }
}

/// Usage: substringBefore("a-b-c", "-") -> "a"
pub fn substring_before(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let separator = as_str(&args[1])?;
    if separator.is_empty() {
        return Ok(Value::string(""));
    }
    match s.find(separator) {
        Some(index) => Ok(Value::string(&s[..index])),
        None => Ok(args[0].clone()),
    }
}

/// Usage: substringBeforeLast("a-b-c", "-") -> "a-b"
pub fn substring_before_last(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let separator = as_str(&args[1])?;
    if separator.is_empty() {
        return Ok(args[0].clone());
    }
    match s.rfind(separator) {
        Some(index) => Ok(Value::string(&s[..index])),
        None => Ok(args[0].clone()),
    }
}

/// Strip the wrapper from either end where present.
/// Usage: unwrap("'hello'", "'") -> "hello"
pub fn unwrap(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let wrapper = as_str(&args[1])?;
    if wrapper.is_empty() {
        return Ok(args[0].clone());
    }
    let mut out = s;
    if let Some(stripped) = out.strip_prefix(wrapper) {
        out = stripped;
    }
    if let Some(stripped) = out.strip_suffix(wrapper) {
        out = stripped;
    }
    Ok(Value::string(out))
}

/// Usage: withMaxSize("hello", 3) -> "hel"
pub fn with_max_size(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let size = as_int(&args[1])?.max(0) as usize;
    Ok(Value::string(s.chars().take(size).collect::<String>()))
}

/// Usage: wrapIfMissing("'hello", "'") -> "'hello'"
pub fn wrap_if_missing(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let wrapper = as_str(&args[1])?;
    let mut out = String::new();
    if !s.starts_with(wrapper) {
        out.push_str(wrapper);
    }
    out.push_str(s);
    if !s.ends_with(wrapper) || s.len() < wrapper.len() {
        out.push_str(wrapper);
    }
    Ok(Value::string(out))
}

/// Usage: wrapWith("hello", "'") -> "'hello'"
pub fn wrap_with(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let wrapper = as_str(&args[1])?;
    Ok(Value::string(format!("{}{}{}", wrapper, s, wrapper)))
}
