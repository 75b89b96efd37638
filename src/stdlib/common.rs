//! Argument validation and callback dispatch shared by every builtin.

use crate::error::{Error, Result};
use crate::eval::apply;
use crate::value::{render_num, Function, Object, Thunk, Value};
use std::rc::Rc;

pub(crate) fn expect_arg_count(args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(Error::type_mismatch(
            format!(
                "exactly {} argument{}",
                expected,
                if expected == 1 { "" } else { "s" }
            ),
            format!("{} arguments", args.len()),
        ));
    }
    Ok(())
}

pub(crate) fn expect_arg_range(args: &[Value], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        return Err(Error::type_mismatch(
            format!("{} to {} arguments", min, max),
            format!("{} arguments", args.len()),
        ));
    }
    Ok(())
}

pub(crate) fn as_str(value: &Value) -> Result<&str> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(Error::type_mismatch("String", other.pretty_name())),
    }
}

pub(crate) fn as_num(value: &Value) -> Result<f64> {
    match value {
        Value::Num(n) => Ok(*n),
        other => Err(Error::type_mismatch("Number", other.pretty_name())),
    }
}

pub(crate) fn as_int(value: &Value) -> Result<i64> {
    let n = as_num(value)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(Error::Domain(format!(
            "Expected an integer, got: {}",
            render_num(n)
        )));
    }
    Ok(n as i64)
}

pub(crate) fn as_bool(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(Error::type_mismatch("Boolean", other.pretty_name())),
    }
}

pub(crate) fn as_arr(value: &Value) -> Result<&[Thunk]> {
    match value {
        Value::Arr(items) => Ok(items),
        other => Err(Error::type_mismatch("Array", other.pretty_name())),
    }
}

pub(crate) fn as_obj(value: &Value) -> Result<&Object> {
    match value {
        Value::Obj(obj) => Ok(obj),
        other => Err(Error::type_mismatch("Object", other.pretty_name())),
    }
}

pub(crate) fn as_func(value: &Value) -> Result<&Rc<Function>> {
    match value {
        Value::Func(func) => Ok(func),
        other => Err(Error::type_mismatch("Function", other.pretty_name())),
    }
}

/// Force every cell of an array argument.
pub(crate) fn forced_items(items: &[Thunk]) -> Result<Vec<Value>> {
    items.iter().map(|item| item.force()).collect()
}

/// Call an array-combinator callback: `f(element)` or `f(element, index)`.
pub(crate) fn call_array_callback(
    func: &Function,
    element: &Value,
    index: usize,
) -> Result<Value> {
    match func.arity() {
        1 => apply(func, std::slice::from_ref(element)),
        2 => apply(func, &[element.clone(), Value::Num(index as f64)]),
        received => Err(Error::CallbackArity {
            allowed: "1 or 2".to_string(),
            received,
        }),
    }
}

/// Call an object-combinator callback: `f(value)`, `f(value, key)`, or
/// `f(value, key, index)` with index in visible-key iteration order.
pub(crate) fn call_object_callback(
    func: &Function,
    value: &Value,
    key: &str,
    index: usize,
) -> Result<Value> {
    match func.arity() {
        1 => apply(func, std::slice::from_ref(value)),
        2 => apply(func, &[value.clone(), Value::string(key)]),
        3 => apply(
            func,
            &[value.clone(), Value::string(key), Value::Num(index as f64)],
        ),
        received => Err(Error::CallbackArity {
            allowed: "1, 2, or 3".to_string(),
            received,
        }),
    }
}

/// A predicate callback must come back as a boolean.
pub(crate) fn as_predicate_result(value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(Error::type_mismatch("Boolean", other.pretty_name())),
    }
}

/// The element coercion shared by `joinBy` and `toString`: booleans render
/// as `true`/`false`, integers without a fractional part, everything else
/// per default double formatting; arrays and objects are rejected.
pub(crate) fn coerce_scalar(value: &Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        Value::Num(n) => Ok(render_num(*n)),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::type_mismatch(
            "String, Number, or Boolean",
            other.pretty_name(),
        )),
    }
}

/// Validate that every sort key shares one scalar kind, then hand back a
/// total comparator. `orderBy`, `max`, `min` and friends route through this
/// so mixed-kind arrays fail with the documented message.
pub(crate) fn check_sort_keys(keys: &[Value]) -> Result<()> {
    let mut kinds = keys.iter().map(|k| match k {
        Value::Num(_) | Value::Str(_) | Value::Bool(_) => Ok(k.pretty_name()),
        other => Err(Error::OrderKind {
            kind: other.pretty_name().to_string(),
        }),
    });
    let first = match kinds.next() {
        Some(first) => first?,
        None => return Ok(()),
    };
    for kind in kinds {
        let kind = kind?;
        if kind != first {
            return Err(Error::OrderKind {
                kind: kind.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_arg_count_message() {
        let err = expect_arg_count(&[Value::Null], 2).unwrap_err();
        assert_eq!(err.to_string(), "Expected exactly 2 arguments, got: 1 arguments");
    }

    #[test]
    fn test_as_int_rejects_fractions() {
        let err = as_int(&Value::Num(1.5)).unwrap_err();
        assert_eq!(err.to_string(), "Expected an integer, got: 1.5");
        assert_eq!(as_int(&Value::Num(-3.0)).unwrap(), -3);
    }

    #[test]
    fn test_array_callback_arity_error() {
        let func = Function::native(&["a", "b", "c"], |_| Ok(Value::Null));
        let err = call_array_callback(&func, &Value::Null, 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected embedded function to have 1 or 2 parameters, received: 3"
        );
    }

    #[test]
    fn test_object_callback_shapes() {
        let two = Function::native(&["v", "k"], |args| {
            Ok(Value::string(format!(
                "{}:{}",
                super::as_str(&args[1]).unwrap(),
                super::as_num(&args[0]).unwrap()
            )))
        });
        let result = call_object_callback(&two, &Value::Num(1.0), "a", 0).unwrap();
        assert_eq!(result, Value::string("a:1"));
    }

    #[test]
    fn test_check_sort_keys_mixed_kinds() {
        let err = check_sort_keys(&[Value::Num(1.0), Value::string("a")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected Array of type String, Boolean, or Number, got: Array of type string"
        );
        assert!(check_sort_keys(&[Value::Num(1.0), Value::Num(2.0)]).is_ok());
        assert!(check_sort_keys(&[]).is_ok());
    }

    #[test]
    fn test_coerce_scalar() {
        assert_eq!(coerce_scalar(&Value::Num(5.0)).unwrap(), "5");
        assert_eq!(coerce_scalar(&Value::Num(5.5)).unwrap(), "5.5");
        assert_eq!(coerce_scalar(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(coerce_scalar(&Value::string("x")).unwrap(), "x");
        assert!(coerce_scalar(&Value::array(vec![])).is_err());
    }
}
