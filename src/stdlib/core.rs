//! The root namespace: array/object/string primitives, higher-order
//! combinators, and the coercion entry points. Functions dispatch on the
//! runtime variant of their first argument (or first two for the binary
//! combinators).

use super::common::*;
use crate::error::{Error, Result};
use crate::value::{
    compare_scalars, num_is_integer, structural_eq, Member, Object, Thunk, Value,
};
use regex::Regex;
use std::cmp::Ordering;

/// Append a value to the end of an array.
/// Usage: append([1, 2], 3) -> [1, 2, 3]
pub fn append(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let mut out: Vec<Thunk> = items.to_vec();
    out.push(Thunk::forced(args[1].clone()));
    Ok(Value::array_of_thunks(out))
}

/// Prepend a value to the front of an array.
/// Usage: prepend([2, 3], 1) -> [1, 2, 3]
pub fn prepend(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let mut out = Vec::with_capacity(items.len() + 1);
    out.push(Thunk::forced(args[1].clone()));
    out.extend(items.iter().cloned());
    Ok(Value::array_of_thunks(out))
}

/// Combine two values: strings and numbers concatenate (integers render
/// without a fractional part), arrays concatenate, objects merge.
/// Usage: combine(5, "10") -> "510"
pub fn combine(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Str(_) | Value::Num(_), Value::Str(_) | Value::Num(_)) => {
            let mut out = coerce_scalar(&args[0])?;
            out.push_str(&coerce_scalar(&args[1])?);
            Ok(Value::string(out))
        }
        (Value::Arr(a), Value::Arr(b)) => {
            let mut items: Vec<Thunk> = a.as_ref().clone();
            items.extend(b.iter().cloned());
            Ok(Value::array_of_thunks(items))
        }
        (Value::Obj(a), Value::Obj(b)) => {
            let mut merged = Object::new();
            for (key, member) in a.visible_entries() {
                merged.insert(key, member.clone());
            }
            for (key, member) in b.visible_entries() {
                merged.insert(key, member.clone());
            }
            Ok(Value::object(merged))
        }
        (Value::Str(_) | Value::Num(_) | Value::Arr(_) | Value::Obj(_), other) => Err(
            Error::type_mismatch("String, Number, Array, or Object", other.pretty_name()),
        ),
        (other, _) => Err(Error::type_mismatch(
            "String, Number, Array, or Object",
            other.pretty_name(),
        )),
    }
}

/// Usage: contains([1, 2, 3], 2) -> true; contains("hello", "ell") -> true
pub fn contains(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    match &args[0] {
        Value::Arr(items) => {
            for item in items.iter() {
                if structural_eq(&item.force()?, &args[1])? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Value::Str(s) => {
            let needle = as_str(&args[1])?;
            Ok(Value::Bool(s.contains(needle)))
        }
        other => Err(Error::type_mismatch("Array or String", other.pretty_name())),
    }
}

/// Keep the first occurrence of each discriminator value.
/// Usage: distinctBy([1, 2, 1], function(item) item) -> [1, 2]
pub fn distinct_by(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let func = as_func(&args[1])?;
    match &args[0] {
        Value::Arr(items) => {
            let mut seen: Vec<Value> = Vec::new();
            let mut out: Vec<Thunk> = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let element = item.force()?;
                let key = call_array_callback(func, &element, index)?;
                if !contains_value(&seen, &key)? {
                    seen.push(key);
                    out.push(item.clone());
                }
            }
            Ok(Value::array_of_thunks(out))
        }
        Value::Obj(obj) => {
            let mut seen: Vec<Value> = Vec::new();
            let mut out = Object::new();
            for (index, (key, member)) in obj.visible_entries().enumerate() {
                let value = member.value.force()?;
                let discriminator = call_object_callback(func, &value, key, index)?;
                if !contains_value(&seen, &discriminator)? {
                    seen.push(discriminator);
                    out.insert(key, member.clone());
                }
            }
            Ok(Value::object(out))
        }
        other => Err(Error::type_mismatch("Array or Object", other.pretty_name())),
    }
}

fn contains_value(haystack: &[Value], needle: &Value) -> Result<bool> {
    for candidate in haystack {
        if structural_eq(candidate, needle)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Case-insensitive suffix test: both operands are uppercased first.
/// Usage: endsWith("Hello World", "world") -> true
pub fn ends_with(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let main = as_str(&args[0])?.to_uppercase();
    let sub = as_str(&args[1])?.to_uppercase();
    Ok(Value::Bool(main.ends_with(&sub)))
}

/// Case-insensitive prefix test: both operands are uppercased first.
/// Usage: startsWith("Hello World", "hello") -> true
pub fn starts_with(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let main = as_str(&args[0])?.to_uppercase();
    let sub = as_str(&args[1])?.to_uppercase();
    Ok(Value::Bool(main.starts_with(&sub)))
}

/// Usage: entriesOf({a: 1}) -> [{key: "a", value: 1}]
pub fn entries_of(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let obj = as_obj(&args[0])?;
    let mut out = Vec::new();
    for (key, member) in obj.visible_entries() {
        let mut entry = Object::new();
        entry.insert("key", Member::normal(Thunk::forced(Value::string(key))));
        entry.insert("value", Member::normal(member.value.clone()));
        out.push(Thunk::forced(Value::object(entry)));
    }
    Ok(Value::array_of_thunks(out))
}

/// Usage: keysOf({a: 1, b: 2}) -> ["a", "b"]
pub fn keys_of(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let obj = as_obj(&args[0])?;
    Ok(Value::array(
        obj.visible_keys().map(Value::string).collect(),
    ))
}

/// Usage: valuesOf({a: 1, b: 2}) -> [1, 2]
pub fn values_of(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let obj = as_obj(&args[0])?;
    Ok(Value::array_of_thunks(
        obj.visible_entries()
            .map(|(_, member)| member.value.clone())
            .collect(),
    ))
}

/// Usage: filter([1, 2, 3], function(item) item > 1) -> [2, 3]
pub fn filter(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut out = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        if as_predicate_result(call_array_callback(func, &element, index)?)? {
            out.push(item.clone());
        }
    }
    Ok(Value::array_of_thunks(out))
}

/// Usage: filterObject({a: 1, b: 2}, function(value, key) value > 1) -> {b: 2}
pub fn filter_object(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let obj = as_obj(&args[0])?;
    let func = as_func(&args[1])?;
    let mut out = Object::new();
    for (index, (key, member)) in obj.visible_entries().enumerate() {
        let value = member.value.force()?;
        if as_predicate_result(call_object_callback(func, &value, key, index)?)? {
            out.insert(key, member.clone());
        }
    }
    Ok(Value::object(out))
}

/// Indexes at which a value (or substring) occurs.
/// Usage: find("aba", "a") -> [0, 2]; find([1, 2, 1], 1) -> [0, 2]
pub fn find(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    match &args[0] {
        Value::Str(s) => {
            let needle = as_str(&args[1])?;
            if needle.is_empty() {
                return Ok(Value::array(vec![]));
            }
            let mut out = Vec::new();
            // byte offsets converted to character offsets
            for (byte_index, _) in s.match_indices(needle) {
                let char_index = s[..byte_index].chars().count();
                out.push(Value::Num(char_index as f64));
            }
            Ok(Value::array(out))
        }
        Value::Arr(items) => {
            let mut out = Vec::new();
            for (index, item) in items.iter().enumerate() {
                if structural_eq(&item.force()?, &args[1])? {
                    out.push(Value::Num(index as f64));
                }
            }
            Ok(Value::array(out))
        }
        other => Err(Error::type_mismatch("Array or String", other.pretty_name())),
    }
}

/// Usage: flatMap([1, 2], function(item) [item, item]) -> [1, 1, 2, 2]
pub fn flat_map(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut out: Vec<Thunk> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        match call_array_callback(func, &element, index)? {
            Value::Arr(mapped) => out.extend(mapped.iter().cloned()),
            other => return Err(Error::type_mismatch("Array", other.pretty_name())),
        }
    }
    Ok(Value::array_of_thunks(out))
}

/// Splice nested arrays one level; null elements pass through untouched.
/// Usage: flatten([[1], null, [2, 3]]) -> [1, null, 2, 3]
pub fn flatten(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let items = as_arr(&args[0])?;
    let mut out: Vec<Thunk> = Vec::new();
    for item in items.iter() {
        match item.force()? {
            Value::Arr(inner) => out.extend(inner.iter().cloned()),
            Value::Null => out.push(Thunk::forced(Value::Null)),
            other => return Err(Error::type_mismatch("Array", other.pretty_name())),
        }
    }
    Ok(Value::array_of_thunks(out))
}

/// Fold from the left; the callback receives `(current, previous)`.
/// Usage: foldLeft([1, 2, 3], 0, function(curr, prev) curr + prev) -> 6
pub fn fold_left(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 3)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[2])?;
    fold_impl(items.iter(), args[1].clone(), func)
}

/// Fold in reversed iteration order with the same callback shape.
/// Usage: foldRight([1, 2, 3], 0, function(curr, prev) curr + prev) -> 6
pub fn fold_right(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 3)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[2])?;
    fold_impl(items.iter().rev(), args[1].clone(), func)
}

fn fold_impl<'a>(
    items: impl Iterator<Item = &'a Thunk>,
    init: Value,
    func: &crate::value::Function,
) -> Result<Value> {
    if func.arity() != 2 {
        return Err(Error::CallbackArity {
            allowed: "2".to_string(),
            received: func.arity(),
        });
    }
    let mut acc = init;
    for item in items {
        let element = item.force()?;
        acc = crate::eval::apply(func, &[element, acc])?;
    }
    Ok(acc)
}

/// Group elements (or members) by a string discriminator, preserving
/// insertion order inside each group.
/// Usage: groupBy([{k: "a"}, {k: "b"}, {k: "a"}], function(item) item.k)
pub fn group_by(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let func = as_func(&args[1])?;
    match &args[0] {
        Value::Arr(items) => {
            let mut groups: Vec<(String, Vec<Thunk>)> = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let element = item.force()?;
                let key = group_key(call_array_callback(func, &element, index)?)?;
                match groups.iter_mut().find(|(name, _)| *name == key) {
                    Some((_, group)) => group.push(item.clone()),
                    None => groups.push((key, vec![item.clone()])),
                }
            }
            let mut out = Object::new();
            for (key, group) in groups {
                out.insert(
                    key,
                    Member::normal(Thunk::forced(Value::array_of_thunks(group))),
                );
            }
            Ok(Value::object(out))
        }
        Value::Obj(obj) => {
            let mut groups: Vec<(String, Object)> = Vec::new();
            for (index, (key, member)) in obj.visible_entries().enumerate() {
                let value = member.value.force()?;
                let group_name = group_key(call_object_callback(func, &value, key, index)?)?;
                match groups.iter_mut().find(|(name, _)| *name == group_name) {
                    Some((_, group)) => group.insert(key, member.clone()),
                    None => {
                        let mut group = Object::new();
                        group.insert(key, member.clone());
                        groups.push((group_name, group));
                    }
                }
            }
            let mut out = Object::new();
            for (name, group) in groups {
                out.insert(name, Member::normal(Thunk::forced(Value::object(group))));
            }
            Ok(Value::object(out))
        }
        other => Err(Error::type_mismatch("Array or Object", other.pretty_name())),
    }
}

fn group_key(value: Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(Error::type_mismatch("String", other.pretty_name())),
    }
}

pub fn is_array(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Arr(_))))
}

pub fn is_boolean(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
}

pub fn is_function(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Func(_))))
}

pub fn is_number(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Num(_))))
}

pub fn is_object(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Obj(_))))
}

pub fn is_string(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(matches!(args[0], Value::Str(_))))
}

/// Usage: isBlank("  ") -> true; isBlank(null) -> true
pub fn is_blank(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    match &args[0] {
        Value::Null => Ok(Value::Bool(true)),
        Value::Str(s) => Ok(Value::Bool(s.trim().is_empty())),
        other => Err(Error::type_mismatch("String", other.pretty_name())),
    }
}

/// Usage: isEmpty([]) -> true; isEmpty(null) -> true
pub fn is_empty(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    match &args[0] {
        Value::Null => Ok(Value::Bool(true)),
        Value::Str(s) => Ok(Value::Bool(s.is_empty())),
        Value::Arr(items) => Ok(Value::Bool(items.is_empty())),
        Value::Obj(obj) => Ok(Value::Bool(obj.visible_len() == 0)),
        other => Err(Error::type_mismatch(
            "String, Array, or Object",
            other.pretty_name(),
        )),
    }
}

/// The variant carries no integer/decimal split; these derive it.
/// Usage: isInteger(2.0) -> true; isDecimal(2.5) -> true
pub fn is_integer(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(num_is_integer(as_num(&args[0])?)))
}

pub fn is_decimal(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::Bool(!num_is_integer(as_num(&args[0])?)))
}

pub fn is_even(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let n = as_num(&args[0])?;
    Ok(Value::Bool(num_is_integer(n) && (n as i64) % 2 == 0))
}

pub fn is_odd(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let n = as_num(&args[0])?;
    Ok(Value::Bool(num_is_integer(n) && (n as i64) % 2 != 0))
}

/// Usage: joinBy([1, true, "x"], "-") -> "1-true-x"
pub fn join_by(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let separator = as_str(&args[1])?;
    let mut rendered = Vec::with_capacity(items.len());
    for item in items.iter() {
        rendered.push(coerce_scalar(&item.force()?)?);
    }
    Ok(Value::string(rendered.join(separator)))
}

pub fn lower(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(as_str(&args[0])?.to_lowercase()))
}

pub fn upper(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(as_str(&args[0])?.to_uppercase()))
}

pub fn trim(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(as_str(&args[0])?.trim()))
}

/// Usage: map([1, 2], function(item, index) item * 10 + index) -> [10, 21]
pub fn map(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        out.push(call_array_callback(func, &element, index)?);
    }
    Ok(Value::array(out))
}

/// Collect `f(value, key, index)` results into an array.
/// Usage: mapEntries({a: 1}, function(value, key) key) -> ["a"]
pub fn map_entries(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let obj = as_obj(&args[0])?;
    let func = as_func(&args[1])?;
    let mut out = Vec::new();
    for (index, (key, member)) in obj.visible_entries().enumerate() {
        let value = member.value.force()?;
        out.push(call_object_callback(func, &value, key, index)?);
    }
    Ok(Value::array(out))
}

/// Each callback result must be an object; their visible keys merge into
/// the result with later keys winning on collision.
/// Usage: mapObject({a: 1}, function(value, key) {[key]: value * 2}) -> {a: 2}
pub fn map_object(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let obj = as_obj(&args[0])?;
    let func = as_func(&args[1])?;
    let mut out = Object::new();
    for (index, (key, member)) in obj.visible_entries().enumerate() {
        let value = member.value.force()?;
        match call_object_callback(func, &value, key, index)? {
            Value::Obj(mapped) => {
                for (mapped_key, mapped_member) in mapped.visible_entries() {
                    out.insert(mapped_key, mapped_member.clone());
                }
            }
            other => return Err(Error::type_mismatch("Object", other.pretty_name())),
        }
    }
    Ok(Value::object(out))
}

/// Capture groups of the first whole-string match (full match first);
/// no match yields an empty array.
/// Usage: match("a@b", "(.*)@(.*)") -> ["a@b", "a", "b"]
pub fn match_(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let input = as_str(&args[0])?;
    let re = compile_anchored(as_str(&args[1])?)?;
    match re.captures(input) {
        Some(captures) => Ok(Value::array(
            captures
                .iter()
                .map(|group| match group {
                    Some(m) => Value::string(m.as_str()),
                    None => Value::Null,
                })
                .collect(),
        )),
        None => Ok(Value::array(vec![])),
    }
}

/// Whole-string regex test.
/// Usage: matches("123", "[0-9]+") -> true
pub fn matches(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let input = as_str(&args[0])?;
    let re = compile_anchored(as_str(&args[1])?)?;
    Ok(Value::Bool(re.is_match(input)))
}

/// All matches, each as its capture-group array (full match first).
/// Usage: scan("a1 b2", "(\\w)(\\d)") -> [["a1", "a", "1"], ["b2", "b", "2"]]
pub fn scan(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let input = as_str(&args[0])?;
    let re = compile_pattern(as_str(&args[1])?)?;
    let mut out = Vec::new();
    for captures in re.captures_iter(input) {
        out.push(Value::array(
            captures
                .iter()
                .map(|group| match group {
                    Some(m) => Value::string(m.as_str()),
                    None => Value::Null,
                })
                .collect(),
        ));
    }
    Ok(Value::array(out))
}

pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Domain(format!("Invalid regular expression: {}", e)))
}

fn compile_anchored(pattern: &str) -> Result<Regex> {
    compile_pattern(&format!("^(?:{})$", pattern))
}

/// Usage: max([1, 5, 3]) -> 5; max([false, true]) -> true
pub fn max(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    extremum(&forced_items(as_arr(&args[0])?)?, Ordering::Greater)
}

/// Usage: min([1, 5, 3]) -> 1; min([true, false]) -> false
pub fn min(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    extremum(&forced_items(as_arr(&args[0])?)?, Ordering::Less)
}

fn extremum(items: &[Value], winning: Ordering) -> Result<Value> {
    check_sort_keys(items)?;
    let mut best = match items.first() {
        Some(first) => first.clone(),
        None => return Err(Error::Domain("Expected a non-empty array".to_string())),
    };
    for item in &items[1..] {
        if compare_scalars(item, &best)? == winning {
            best = item.clone();
        }
    }
    Ok(best)
}

/// Usage: maxBy([{n: 1}, {n: 3}], function(item) item.n) -> {n: 3}
pub fn max_by(args: &[Value]) -> Result<Value> {
    extremum_by(args, Ordering::Greater)
}

/// Usage: minBy([{n: 1}, {n: 3}], function(item) item.n) -> {n: 1}
pub fn min_by(args: &[Value]) -> Result<Value> {
    extremum_by(args, Ordering::Less)
}

fn extremum_by(args: &[Value], winning: Ordering) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut keyed = Vec::with_capacity(items.len());
    let mut keys = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        let key = call_array_callback(func, &element, index)?;
        keys.push(key.clone());
        keyed.push((key, element));
    }
    check_sort_keys(&keys)?;
    let mut iter = keyed.into_iter();
    let (mut best_key, mut best) = iter
        .next()
        .ok_or_else(|| Error::Domain("Expected a non-empty array".to_string()))?;
    for (key, element) in iter {
        if compare_scalars(&key, &best_key)? == winning {
            best_key = key;
            best = element;
        }
    }
    Ok(best)
}

/// Usage: mod(7, 3) -> 1
pub fn modulo(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let a = as_num(&args[0])?;
    let b = as_num(&args[1])?;
    if b == 0.0 {
        return Err(Error::Domain("Division by zero".to_string()));
    }
    Ok(Value::Num(a % b))
}

/// Stable sort by a scalar key.
/// Usage: orderBy([3, 1, 2], function(item) item) -> [1, 2, 3]
pub fn order_by(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let func = as_func(&args[1])?;
    match &args[0] {
        Value::Arr(items) => {
            let mut keyed = Vec::with_capacity(items.len());
            let mut keys = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let element = item.force()?;
                let key = call_array_callback(func, &element, index)?;
                keys.push(key.clone());
                keyed.push((key, item.clone()));
            }
            check_sort_keys(&keys)?;
            keyed.sort_by(|(a, _), (b, _)| {
                compare_scalars(a, b).unwrap_or(Ordering::Equal)
            });
            Ok(Value::array_of_thunks(
                keyed.into_iter().map(|(_, item)| item).collect(),
            ))
        }
        Value::Obj(obj) => {
            let mut keyed = Vec::new();
            let mut keys = Vec::new();
            for (index, (key, member)) in obj.visible_entries().enumerate() {
                let value = member.value.force()?;
                let sort_key = call_object_callback(func, &value, key, index)?;
                keys.push(sort_key.clone());
                keyed.push((sort_key, key.to_string(), member.clone()));
            }
            check_sort_keys(&keys)?;
            keyed.sort_by(|(a, _, _), (b, _, _)| {
                compare_scalars(a, b).unwrap_or(Ordering::Equal)
            });
            let mut out = Object::new();
            for (_, key, member) in keyed {
                out.insert(key, member);
            }
            Ok(Value::object(out))
        }
        other => Err(Error::type_mismatch("Array or Object", other.pretty_name())),
    }
}

/// Usage: parseDouble("1.5") -> 1.5
pub fn parse_double(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let s = as_str(&args[0])?;
    s.trim()
        .parse::<f64>()
        .map(Value::Num)
        .map_err(|_| Error::Domain(format!("Could not parse number: {}", s)))
}

/// Usage: parseInt("42") -> 42
pub fn parse_int(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let s = as_str(&args[0])?;
    parse_radix(s.trim(), 10)
}

/// Usage: parseHex("F0") -> 240
pub fn parse_hex(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    parse_radix(as_str(&args[0])?.trim(), 16)
}

/// Usage: parseOctal("107136") -> 36446
pub fn parse_octal(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    parse_radix(as_str(&args[0])?.trim(), 8)
}

fn parse_radix(s: &str, radix: u32) -> Result<Value> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = i64::from_str_radix(digits, radix)
        .map_err(|_| Error::Domain(format!("Could not parse number: {}", s)))?;
    Ok(Value::Num(if negative {
        -(magnitude as f64)
    } else {
        magnitude as f64
    }))
}

/// Inclusive range of integers.
/// Usage: range(1, 3) -> [1, 2, 3]
pub fn range(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let start = as_int(&args[0])?;
    let end = as_int(&args[1])?;
    Ok(Value::array(
        (start..=end).map(|n| Value::Num(n as f64)).collect(),
    ))
}

/// Remove an object key, or every array element equal to the value.
/// Usage: remove({a: 1, b: 2}, "a") -> {b: 2}; remove([1, 2, 1], 1) -> [2]
pub fn remove(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    match &args[0] {
        Value::Obj(obj) => {
            let key = as_str(&args[1])?;
            let mut out = Object::new();
            for (name, member) in obj.visible_entries() {
                if name != key {
                    out.insert(name, member.clone());
                }
            }
            Ok(Value::object(out))
        }
        Value::Arr(items) => {
            let mut out = Vec::new();
            for item in items.iter() {
                if !structural_eq(&item.force()?, &args[1])? {
                    out.push(item.clone());
                }
            }
            Ok(Value::array_of_thunks(out))
        }
        other => Err(Error::type_mismatch("Array or Object", other.pretty_name())),
    }
}

/// Remove a set of keys (object) or values (array).
/// Usage: removeAll({a: 1, b: 2, c: 3}, ["a", "c"]) -> {b: 2}
pub fn remove_all(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let targets = forced_items(as_arr(&args[1])?)?;
    match &args[0] {
        Value::Obj(obj) => {
            let mut keys = Vec::with_capacity(targets.len());
            for target in &targets {
                keys.push(as_str(target)?.to_string());
            }
            let mut out = Object::new();
            for (name, member) in obj.visible_entries() {
                if !keys.iter().any(|key| key == name) {
                    out.insert(name, member.clone());
                }
            }
            Ok(Value::object(out))
        }
        Value::Arr(items) => {
            let mut out = Vec::new();
            for item in items.iter() {
                if !contains_value(&targets, &item.force()?)? {
                    out.push(item.clone());
                }
            }
            Ok(Value::array_of_thunks(out))
        }
        other => Err(Error::type_mismatch("Array or Object", other.pretty_name())),
    }
}

/// Literal substring replacement.
/// Usage: replace("123-456", "-", "") -> "123456"
pub fn replace(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 3)?;
    let s = as_str(&args[0])?;
    let from = as_str(&args[1])?;
    let to = as_str(&args[2])?;
    Ok(Value::string(s.replace(from, to)))
}

/// Reverse a string (by codepoint), an array, or an object's key order.
/// Usage: reverse([1, 2, 3]) -> [3, 2, 1]
pub fn reverse(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::string(s.chars().rev().collect::<String>())),
        Value::Arr(items) => Ok(Value::array_of_thunks(
            items.iter().rev().cloned().collect(),
        )),
        Value::Obj(obj) => {
            let entries: Vec<(String, Member)> = obj
                .visible_entries()
                .map(|(key, member)| (key.to_string(), member.clone()))
                .collect();
            let mut out = Object::new();
            for (key, member) in entries.into_iter().rev() {
                out.insert(key, member);
            }
            Ok(Value::object(out))
        }
        other => Err(Error::type_mismatch(
            "String, Array, or Object",
            other.pretty_name(),
        )),
    }
}

/// Walk a dotted path through nested objects; an unresolved key is null,
/// never an error.
/// Usage: select({a: {b: 1}}, "a.b") -> 1
pub fn select(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let path = as_str(&args[1])?;
    let mut current = args[0].clone();
    for segment in path.split('.') {
        match &current {
            Value::Obj(obj) => match obj.get(segment) {
                Some(member) => current = member.value.force()?,
                None => return Ok(Value::Null),
            },
            _ => return Ok(Value::Null),
        }
    }
    Ok(current)
}

/// Usage: sizeOf([1, 2]) -> 2; sizeOf(null) -> 0
pub fn size_of(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let size = match &args[0] {
        Value::Null => 0,
        Value::Str(s) => s.chars().count(),
        Value::Arr(items) => items.len(),
        Value::Obj(obj) => obj.visible_len(),
        Value::Func(func) => func.arity(),
        other => {
            return Err(Error::type_mismatch(
                "Array, String, Object, Function, or Null",
                other.pretty_name(),
            ))
        }
    };
    Ok(Value::Num(size as f64))
}

/// Literal split; an empty separator splits into single characters.
/// Usage: splitBy("a-b-c", "-") -> ["a", "b", "c"]
pub fn split_by(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let s = as_str(&args[0])?;
    let separator = as_str(&args[1])?;
    let parts: Vec<Value> = if separator.is_empty() {
        s.chars().map(|c| Value::string(c.to_string())).collect()
    } else {
        s.split(separator).map(Value::string).collect()
    };
    Ok(Value::array(parts))
}

/// Scalar-to-string coercion; null renders as "null".
/// Usage: toString(5) -> "5"; toString(true) -> "true"
pub fn to_string(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    match &args[0] {
        Value::Null => Ok(Value::string("null")),
        other => Ok(Value::string(coerce_scalar(other)?)),
    }
}

/// Usage: typeOf([]) -> "array"
pub fn type_of(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    Ok(Value::string(args[0].pretty_name()))
}

/// Transpose an array of arrays.
/// Usage: unzip([[1, "a"], [2, "b"]]) -> [[1, 2], ["a", "b"]]
pub fn unzip(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let rows = as_arr(&args[0])?;
    let mut columns: Vec<Vec<Thunk>> = Vec::new();
    for row in rows.iter() {
        match row.force()? {
            Value::Arr(cells) => {
                for (index, cell) in cells.iter().enumerate() {
                    if columns.len() <= index {
                        columns.push(Vec::new());
                    }
                    columns[index].push(cell.clone());
                }
            }
            other => return Err(Error::type_mismatch("Array", other.pretty_name())),
        }
    }
    Ok(Value::array(
        columns.into_iter().map(Value::array_of_thunks).collect(),
    ))
}

/// Pair elements of two arrays up to the shorter length.
/// Usage: zip([1, 2], ["a", "b"]) -> [[1, "a"], [2, "b"]]
pub fn zip(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let left = as_arr(&args[0])?;
    let right = as_arr(&args[1])?;
    let out: Vec<Value> = left
        .iter()
        .zip(right.iter())
        .map(|(a, b)| Value::array_of_thunks(vec![a.clone(), b.clone()]))
        .collect();
    Ok(Value::array(out))
}

/// A random v4 UUID.
pub fn uuid(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 0)?;
    Ok(Value::string(uuid::Uuid::new_v4().to_string()))
}
