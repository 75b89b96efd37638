//! The `objects` namespace: entry-wise combinators over insertion-ordered
//! members.

use super::common::*;
use crate::error::{Error, Result};
use crate::value::{Object, Value};

/// Chunk entries into objects of the given size, preserving order.
/// Usage: divideBy({a: 1, b: 2, c: 3}, 2) -> [{a: 1, b: 2}, {c: 3}]
pub fn divide_by(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let obj = as_obj(&args[0])?;
    let size = as_int(&args[1])?;
    if size <= 0 {
        return Err(Error::Domain(format!("Invalid chunk size: {}", size)));
    }
    let mut chunks = Vec::new();
    let mut current = Object::new();
    let mut count = 0;
    for (key, member) in obj.visible_entries() {
        current.insert(key, member.clone());
        count += 1;
        if count == size {
            chunks.push(Value::object(std::mem::take(&mut current)));
            count = 0;
        }
    }
    if count > 0 {
        chunks.push(Value::object(current));
    }
    Ok(Value::array(chunks))
}

/// Usage: everyEntry({a: 1, b: 2}, function(value, key) value > 0) -> true
pub fn every_entry(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Bool(true));
    }
    let obj = as_obj(&args[0])?;
    let func = as_func(&args[1])?;
    for (index, (key, member)) in obj.visible_entries().enumerate() {
        let value = member.value.force()?;
        if !as_predicate_result(call_object_callback(func, &value, key, index)?)? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Usage: someEntry({a: 1}, function(value, key) value > 1) -> false
pub fn some_entry(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Bool(false));
    }
    let obj = as_obj(&args[0])?;
    let func = as_func(&args[1])?;
    for (index, (key, member)) in obj.visible_entries().enumerate() {
        let value = member.value.force()?;
        if as_predicate_result(call_object_callback(func, &value, key, index)?)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// Usage: keySet({a: 1}) -> ["a"]
pub fn key_set(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let obj = as_obj(&args[0])?;
    Ok(Value::array(obj.visible_keys().map(Value::string).collect()))
}

/// Usage: valueSet({a: 1}) -> [1]
pub fn value_set(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 1)?;
    let obj = as_obj(&args[0])?;
    Ok(Value::array_of_thunks(
        obj.visible_entries()
            .map(|(_, member)| member.value.clone())
            .collect(),
    ))
}

/// Merge two objects; right-hand keys win, left-hand positions are kept.
/// Usage: mergeWith({a: 1}, {b: 2}) -> {a: 1, b: 2}
pub fn merge_with(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(args[1].clone());
    }
    if args[1].is_null() {
        return Ok(args[0].clone());
    }
    let left = as_obj(&args[0])?;
    let right = as_obj(&args[1])?;
    let mut merged = Object::new();
    for (key, member) in left.visible_entries() {
        merged.insert(key, member.clone());
    }
    for (key, member) in right.visible_entries() {
        merged.insert(key, member.clone());
    }
    Ok(Value::object(merged))
}

/// The leading entries while the predicate holds.
/// Usage: takeWhile({a: 1, b: 9, c: 1}, function(value, key) value < 5) -> {a: 1}
pub fn take_while(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    let obj = as_obj(&args[0])?;
    let func = as_func(&args[1])?;
    let mut out = Object::new();
    for (index, (key, member)) in obj.visible_entries().enumerate() {
        let value = member.value.force()?;
        if !as_predicate_result(call_object_callback(func, &value, key, index)?)? {
            break;
        }
        out.insert(key, member.clone());
    }
    Ok(Value::object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Function;

    fn num(n: f64) -> Value {
        Value::Num(n)
    }

    fn obj(pairs: Vec<(&str, Value)>) -> Value {
        Value::object_from_pairs(
            pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        )
    }

    fn value_below(limit: f64) -> Value {
        Value::function(Function::native(&["value", "key"], move |args| {
            Ok(Value::Bool(as_num(&args[0])? < limit))
        }))
    }

    #[test]
    fn test_divide_by_preserves_order() {
        let input = obj(vec![("a", num(1.0)), ("b", num(2.0)), ("c", num(3.0))]);
        assert_eq!(
            divide_by(&[input, num(2.0)]).unwrap(),
            Value::array(vec![
                obj(vec![("a", num(1.0)), ("b", num(2.0))]),
                obj(vec![("c", num(3.0))]),
            ])
        );
    }

    #[test]
    fn test_every_entry_and_some_entry() {
        let input = obj(vec![("a", num(1.0)), ("b", num(2.0))]);
        assert_eq!(every_entry(&[input.clone(), value_below(5.0)]).unwrap(), Value::Bool(true));
        assert_eq!(every_entry(&[input.clone(), value_below(2.0)]).unwrap(), Value::Bool(false));
        assert_eq!(some_entry(&[input.clone(), value_below(2.0)]).unwrap(), Value::Bool(true));
        assert_eq!(some_entry(&[input, value_below(0.0)]).unwrap(), Value::Bool(false));
        assert_eq!(every_entry(&[Value::Null, value_below(1.0)]).unwrap(), Value::Bool(true));
        assert_eq!(some_entry(&[Value::Null, value_below(1.0)]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_merge_with_right_wins() {
        let left = obj(vec![("a", num(1.0)), ("b", num(2.0))]);
        let right = obj(vec![("b", num(9.0)), ("c", num(3.0))]);
        let merged = merge_with(&[left, right]).unwrap();
        assert_eq!(
            merged,
            obj(vec![("a", num(1.0)), ("b", num(9.0)), ("c", num(3.0))])
        );
        match merged {
            Value::Obj(o) => {
                let keys: Vec<&str> = o.visible_keys().collect();
                assert_eq!(keys, vec!["a", "b", "c"]);
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_with_null_sides() {
        let right = obj(vec![("a", num(1.0))]);
        assert_eq!(merge_with(&[Value::Null, right.clone()]).unwrap(), right.clone());
        assert_eq!(merge_with(&[right.clone(), Value::Null]).unwrap(), right);
    }

    #[test]
    fn test_take_while_stops_at_first_failure() {
        let input = obj(vec![("a", num(1.0)), ("b", num(9.0)), ("c", num(1.0))]);
        assert_eq!(
            take_while(&[input, value_below(5.0)]).unwrap(),
            obj(vec![("a", num(1.0))])
        );
    }

    #[test]
    fn test_key_set_value_set() {
        let input = obj(vec![("b", num(2.0)), ("a", num(1.0))]);
        assert_eq!(
            key_set(&[input.clone()]).unwrap(),
            Value::array(vec![Value::string("b"), Value::string("a")])
        );
        assert_eq!(
            value_set(&[input]).unwrap(),
            Value::array(vec![num(2.0), num(1.0)])
        );
    }
}
