//! The `regex` namespace. Match results are objects of the shape
//! `{string, captures, namedCaptures}`; a failed match is null.

use super::common::*;
use super::core::compile_pattern;
use crate::error::Result;
use crate::value::{Member, Object, Thunk, Value};
use regex::{Captures, Regex};

fn match_object(re: &Regex, captures: &Captures) -> Value {
    let full = captures.get(0).map(|m| m.as_str()).unwrap_or("");
    let groups: Vec<Value> = captures
        .iter()
        .skip(1)
        .map(|group| match group {
            Some(m) => Value::string(m.as_str()),
            None => Value::Null,
        })
        .collect();
    let mut named = Object::new();
    for name in re.capture_names().flatten() {
        let value = match captures.name(name) {
            Some(m) => Value::string(m.as_str()),
            None => Value::Null,
        };
        named.insert(name, Member::normal(Thunk::forced(value)));
    }
    let mut out = Object::new();
    out.insert("string", Member::normal(Thunk::forced(Value::string(full))));
    out.insert(
        "captures",
        Member::normal(Thunk::forced(Value::array(groups))),
    );
    out.insert(
        "namedCaptures",
        Member::normal(Thunk::forced(Value::object(named))),
    );
    Value::object(out)
}

/// Whole-string match, or null.
/// Usage: regexFullMatch("(?P<user>.*)@(.*)", "a@b") -> match object
pub fn regex_full_match(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let re = compile_pattern(&format!("^(?:{})$", as_str(&args[0])?))?;
    let input = as_str(&args[1])?;
    Ok(match re.captures(input) {
        Some(captures) => match_object(&re, &captures),
        None => Value::Null,
    })
}

/// First match anywhere in the input, or null.
/// Usage: regexPartialMatch("\\d+", "abc 123") -> match object
pub fn regex_partial_match(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let re = compile_pattern(as_str(&args[0])?)?;
    let input = as_str(&args[1])?;
    Ok(match re.captures(input) {
        Some(captures) => match_object(&re, &captures),
        None => Value::Null,
    })
}

/// Every match in the input as an array of match objects.
/// Usage: regexScan("\\w+@\\w+", "a@b c@d") -> [match, match]
pub fn regex_scan(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let re = compile_pattern(as_str(&args[0])?)?;
    let input = as_str(&args[1])?;
    let out: Vec<Value> = re
        .captures_iter(input)
        .map(|captures| match_object(&re, &captures))
        .collect();
    Ok(Value::array(out))
}

/// Escape every regex metacharacter.
/// Usage: regexQuoteMeta("1.5-2.0") -> "1\\.5\\-2\\.0"
pub fn regex_quote_meta(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(regex::escape(as_str(&args[0])?)))
}

/// Replace the first match; `$1`-style group references apply.
/// Usage: regexReplace("wishyfishy", "ishy", "") -> "wfishy"
pub fn regex_replace(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 3)?;
    let input = as_str(&args[0])?;
    let re = compile_pattern(as_str(&args[1])?)?;
    let replacement = as_str(&args[2])?;
    Ok(Value::string(re.replace(input, replacement)))
}

/// Replace every match.
/// Usage: regexGlobalReplace("wishyfishy", "ishy", "") -> "wf"
pub fn regex_global_replace(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 3)?;
    let input = as_str(&args[0])?;
    let re = compile_pattern(as_str(&args[1])?)?;
    let replacement = as_str(&args[2])?;
    Ok(Value::string(re.replace_all(input, replacement)))
}
