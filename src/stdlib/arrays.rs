//! The `arrays` namespace: slicing, partitioning, counting, and the
//! inner/left/outer join family.

use super::common::*;
use crate::error::{Error, Result};
use crate::value::{structural_eq, Function, Member, Object, Thunk, Value};

/// Usage: countBy([1, 2, 3], function(item) item > 1) -> 2
pub fn count_by(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut count = 0;
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        if as_predicate_result(call_array_callback(func, &element, index)?)? {
            count += 1;
        }
    }
    Ok(Value::Num(count as f64))
}

/// Recursively splice nested arrays; null elements pass through.
/// Usage: deepFlatten([[1, [2]], [3]]) -> [1, 2, 3]
pub fn deep_flatten(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let items = as_arr(&args[0])?;
    let mut out = Vec::new();
    deep_flatten_into(items, &mut out)?;
    Ok(Value::array_of_thunks(out))
}

fn deep_flatten_into(items: &[Thunk], out: &mut Vec<Thunk>) -> Result<()> {
    for item in items {
        match item.force()? {
            Value::Arr(inner) => deep_flatten_into(&inner, out)?,
            _ => out.push(item.clone()),
        }
    }
    Ok(())
}

/// Chunk into subarrays of the given size.
/// Usage: divideBy([1, 2, 3, 4, 5], 2) -> [[1, 2], [3, 4], [5]]
pub fn divide_by(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let size = as_int(&args[1])?;
    if size <= 0 {
        return Err(Error::Domain(format!("Invalid chunk size: {}", size)));
    }
    let out: Vec<Value> = items
        .chunks(size as usize)
        .map(|chunk| Value::array_of_thunks(chunk.to_vec()))
        .collect();
    Ok(Value::array(out))
}

/// Usage: drop([1, 2, 3], 2) -> [3]
pub fn drop(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let count = as_int(&args[1])?.max(0) as usize;
    Ok(Value::array_of_thunks(
        items.iter().skip(count).cloned().collect(),
    ))
}

/// Usage: take([1, 2, 3], 2) -> [1, 2]
pub fn take(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let count = as_int(&args[1])?.max(0) as usize;
    Ok(Value::array_of_thunks(
        items.iter().take(count).cloned().collect(),
    ))
}

/// Usage: dropWhile([1, 2, 3, 1], function(item) item < 3) -> [3, 1]
pub fn drop_while(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut out = Vec::new();
    let mut dropping = true;
    for (index, item) in items.iter().enumerate() {
        if dropping {
            let element = item.force()?;
            if as_predicate_result(call_array_callback(func, &element, index)?)? {
                continue;
            }
            dropping = false;
        }
        out.push(item.clone());
    }
    Ok(Value::array_of_thunks(out))
}

/// Usage: takeWhile([1, 2, 3, 1], function(item) item < 3) -> [1, 2]
pub fn take_while(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut out = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        if !as_predicate_result(call_array_callback(func, &element, index)?)? {
            break;
        }
        out.push(item.clone());
    }
    Ok(Value::array_of_thunks(out))
}

/// Each repeated value once, in first-repeat order.
/// Usage: duplicates([1, 2, 1, 3, 2, 1]) -> [1, 2]
pub fn duplicates(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let items = forced_items(as_arr(&args[0])?)?;
    let mut reported: Vec<Value> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if in_values(&reported, item)? {
            continue;
        }
        let mut seen_before = false;
        for earlier in &items[..index] {
            if structural_eq(earlier, item)? {
                seen_before = true;
                break;
            }
        }
        if seen_before {
            reported.push(item.clone());
        }
    }
    Ok(Value::array(reported))
}

fn in_values(haystack: &[Value], needle: &Value) -> Result<bool> {
    for candidate in haystack {
        if structural_eq(candidate, needle)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Usage: every([2, 4], function(item) item % 2 == 0) -> true; every(null, f) -> true
pub fn every(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Bool(true));
    }
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        if !as_predicate_result(call_array_callback(func, &element, index)?)? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Usage: some([1, 2], function(item) item > 1) -> true; some(null, f) -> null
pub fn some(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        if as_predicate_result(call_array_callback(func, &element, index)?)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// First element satisfying the predicate, or null.
/// Usage: firstWith([1, 2, 3], function(item) item > 1) -> 2
pub fn first_with(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        if as_predicate_result(call_array_callback(func, &element, index)?)? {
            return Ok(element);
        }
    }
    Ok(Value::Null)
}

/// Usage: indexOf([1, 2, 1], 1) -> 0; indexOf("banana", "a") -> 1
pub fn index_of(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    match &args[0] {
        Value::Arr(items) => {
            for (index, item) in items.iter().enumerate() {
                if structural_eq(&item.force()?, &args[1])? {
                    return Ok(Value::Num(index as f64));
                }
            }
            Ok(Value::Num(-1.0))
        }
        Value::Str(s) => {
            let needle = as_str(&args[1])?;
            match s.find(needle) {
                Some(byte_index) => Ok(Value::Num(s[..byte_index].chars().count() as f64)),
                None => Ok(Value::Num(-1.0)),
            }
        }
        other => Err(Error::type_mismatch("Array or String", other.pretty_name())),
    }
}

/// Usage: lastIndexOf([1, 2, 1], 1) -> 2
pub fn last_index_of(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    match &args[0] {
        Value::Arr(items) => {
            let mut found = -1.0;
            for (index, item) in items.iter().enumerate() {
                if structural_eq(&item.force()?, &args[1])? {
                    found = index as f64;
                }
            }
            Ok(Value::Num(found))
        }
        Value::Str(s) => {
            let needle = as_str(&args[1])?;
            match s.rfind(needle) {
                Some(byte_index) => Ok(Value::Num(s[..byte_index].chars().count() as f64)),
                None => Ok(Value::Num(-1.0)),
            }
        }
        other => Err(Error::type_mismatch("Array or String", other.pretty_name())),
    }
}

/// Index of the first element satisfying the predicate, or -1.
/// Usage: indexWhere([1, 2, 3], function(item) item > 1) -> 1
pub fn index_where(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        if as_predicate_result(call_array_callback(func, &element, index)?)? {
            return Ok(Value::Num(index as f64));
        }
    }
    Ok(Value::Num(-1.0))
}

/// Count elements per string discriminator.
/// Usage: occurrences(["a", "b", "a"], function(item) item) -> {a: 2, b: 1}
pub fn occurrences(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut counts: Vec<(String, usize)> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        let key = match call_array_callback(func, &element, index)? {
            Value::Str(s) => s.to_string(),
            other => return Err(Error::type_mismatch("String", other.pretty_name())),
        };
        match counts.iter_mut().find(|(name, _)| *name == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    Ok(Value::object_from_pairs(
        counts
            .into_iter()
            .map(|(key, count)| (key, Value::Num(count as f64))),
    ))
}

/// Split into the elements that pass and fail a predicate.
/// Usage: partition([1, 2, 3], function(item) item > 1) -> {success: [2, 3], failure: [1]}
pub fn partition(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut success = Vec::new();
    let mut failure = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        if as_predicate_result(call_array_callback(func, &element, index)?)? {
            success.push(item.clone());
        } else {
            failure.push(item.clone());
        }
    }
    Ok(Value::object_from_pairs(vec![
        ("success".to_string(), Value::array_of_thunks(success)),
        ("failure".to_string(), Value::array_of_thunks(failure)),
    ]))
}

/// Half-open slice by index.
/// Usage: slice([1, 2, 3, 4], 1, 3) -> [2, 3]
pub fn slice(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 3)?;
    let items = as_arr(&args[0])?;
    let start = as_int(&args[1])?.max(0) as usize;
    let end = (as_int(&args[2])?.max(0) as usize).min(items.len());
    if start >= end {
        return Ok(Value::array(vec![]));
    }
    Ok(Value::array_of_thunks(items[start..end].to_vec()))
}

/// Usage: splitAt([1, 2, 3], 1) -> {l: [1], r: [2, 3]}
pub fn split_at(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let at = (as_int(&args[1])?.max(0) as usize).min(items.len());
    Ok(Value::object_from_pairs(vec![
        ("l".to_string(), Value::array_of_thunks(items[..at].to_vec())),
        ("r".to_string(), Value::array_of_thunks(items[at..].to_vec())),
    ]))
}

/// Split before the first element satisfying the predicate.
/// Usage: splitWhere([1, 4, 2], function(item) item > 3) -> {l: [1], r: [4, 2]}
pub fn split_where(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut at = items.len();
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        if as_predicate_result(call_array_callback(func, &element, index)?)? {
            at = index;
            break;
        }
    }
    Ok(Value::object_from_pairs(vec![
        ("l".to_string(), Value::array_of_thunks(items[..at].to_vec())),
        ("r".to_string(), Value::array_of_thunks(items[at..].to_vec())),
    ]))
}

/// Usage: sumBy([{n: 1}, {n: 2}], function(item) item.n) -> 3
pub fn sum_by(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let items = as_arr(&args[0])?;
    let func = as_func(&args[1])?;
    let mut sum = 0.0;
    for (index, item) in items.iter().enumerate() {
        let element = item.force()?;
        sum += as_num(&call_array_callback(func, &element, index)?)?;
    }
    Ok(Value::Num(sum))
}

/// Inner join: a stable left-outer/right-inner cross product of every pair
/// whose keys are structurally equal. Output objects carry `l` and `r`.
/// Usage: join(arrL, arrR, function(item) item.id, function(item) item.id)
pub fn join(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 4)?;
    let (left, right, left_keys, right_keys) = join_inputs(args)?;
    let mut out = Vec::new();
    for (left_index, left_key) in left_keys.iter().enumerate() {
        for (right_index, right_key) in right_keys.iter().enumerate() {
            if structural_eq(left_key, right_key)? {
                out.push(pair_object(Some(&left[left_index]), Some(&right[right_index])));
            }
        }
    }
    Ok(Value::array(out))
}

/// Inner join results plus `{l}` rows for every unmatched left element.
pub fn left_join(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 4)?;
    let (left, right, left_keys, right_keys) = join_inputs(args)?;
    let mut out = Vec::new();
    let mut left_residue: Vec<usize> = (0..left.len()).collect();
    for (left_index, left_key) in left_keys.iter().enumerate() {
        for (right_index, right_key) in right_keys.iter().enumerate() {
            if structural_eq(left_key, right_key)? {
                out.push(pair_object(Some(&left[left_index]), Some(&right[right_index])));
                left_residue.retain(|&residue| residue != left_index);
            }
        }
    }
    for left_index in left_residue {
        out.push(pair_object(Some(&left[left_index]), None));
    }
    Ok(Value::array(out))
}

/// Inner join results, then `{l}` for unmatched left, then `{r}` for
/// unmatched right. A right element is consumed by its first matching left
/// element, so it pairs at most once; left elements can pair many times.
pub fn outer_join(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 4)?;
    let (left, right, left_keys, right_keys) = join_inputs(args)?;
    let mut out = Vec::new();
    let mut left_residue: Vec<usize> = (0..left.len()).collect();
    let mut right_residue: Vec<usize> = (0..right.len()).collect();
    for (left_index, left_key) in left_keys.iter().enumerate() {
        for (right_index, right_key) in right_keys.iter().enumerate() {
            if !right_residue.contains(&right_index) {
                continue;
            }
            if structural_eq(left_key, right_key)? {
                out.push(pair_object(Some(&left[left_index]), Some(&right[right_index])));
                left_residue.retain(|&residue| residue != left_index);
                right_residue.retain(|&residue| residue != right_index);
            }
        }
    }
    for left_index in left_residue {
        out.push(pair_object(Some(&left[left_index]), None));
    }
    for right_index in right_residue {
        out.push(pair_object(None, Some(&right[right_index])));
    }
    Ok(Value::array(out))
}

type JoinInputs = (Vec<Value>, Vec<Value>, Vec<Value>, Vec<Value>);

fn join_inputs(args: &[Value]) -> Result<JoinInputs> {
    let left = forced_items(as_arr(&args[0])?)?;
    let right = forced_items(as_arr(&args[1])?)?;
    let left_func = as_func(&args[2])?;
    let right_func = as_func(&args[3])?;
    let left_keys = keys_for(&left, left_func)?;
    let right_keys = keys_for(&right, right_func)?;
    Ok((left, right, left_keys, right_keys))
}

fn keys_for(items: &[Value], func: &Function) -> Result<Vec<Value>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| call_array_callback(func, item, index))
        .collect()
}

fn pair_object(left: Option<&Value>, right: Option<&Value>) -> Value {
    let mut obj = Object::new();
    if let Some(left) = left {
        obj.insert("l", Member::normal(Thunk::forced(left.clone())));
    }
    if let Some(right) = right {
        obj.insert("r", Member::normal(Thunk::forced(right.clone())));
    }
    Value::object(obj)
}
