//! The runtime value model: a tagged variant over seven kinds, lazy cells
//! with single-assignment memoization, insertion-ordered objects, and the
//! structural equality / per-kind ordering every library function builds on.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A value produced or consumed by the evaluator.
///
/// Arrays hold lazy cells so that elements that are never consumed are never
/// evaluated; objects hold members whose values are equally lazy and whose
/// visible keys iterate in insertion order.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(Rc<str>),
    Arr(Rc<Vec<Thunk>>),
    Obj(Rc<Object>),
    Func(Rc<Function>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Value {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Arr(Rc::new(items.into_iter().map(Thunk::forced).collect()))
    }

    pub fn array_of_thunks(items: Vec<Thunk>) -> Value {
        Value::Arr(Rc::new(items))
    }

    pub fn object(obj: Object) -> Value {
        Value::Obj(Rc::new(obj))
    }

    /// Build an object from eager key/value pairs, all Normal visibility.
    pub fn object_from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Value {
        let mut obj = Object::new();
        for (key, value) in pairs {
            obj.insert(key, Member::normal(Thunk::forced(value)));
        }
        Value::object(obj)
    }

    pub fn function(func: Function) -> Value {
        Value::Func(Rc::new(func))
    }

    /// The lowercase kind tag used in error messages and `typeOf`.
    pub fn pretty_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Arr(_) => "array",
            Value::Obj(_) => "object",
            Value::Func(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Num(n) => write!(f, "{}", render_num(*n)),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Arr(items) => {
                let mut list = f.debug_list();
                for item in items.iter() {
                    list.entry(item);
                }
                list.finish()
            }
            Value::Obj(obj) => {
                let mut map = f.debug_map();
                for (key, member) in obj.visible_entries() {
                    map.entry(&key, &member.value);
                }
                map.finish()
            }
            Value::Func(func) => write!(f, "function({})", func.params().join(", ")),
        }
    }
}

/// Structural equality that forces both sides as needed. Tests and internal
/// lookups use the `PartialEq` impl below, which treats a failed force as
/// unequal; library code that must propagate errors calls this directly.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        structural_eq(self, other).unwrap_or(false)
    }
}

/// Deep equality across lazy values: numbers by value, strings by
/// codepoints, arrays element-wise after forcing, objects by identical
/// visible-key sets with equal values per key. Cross-variant comparisons
/// are unequal, never an error. Functions compare by identity.
pub fn structural_eq(a: &Value, b: &Value) -> Result<bool> {
    match (a, b) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Num(x), Value::Num(y)) => Ok(x == y),
        (Value::Str(x), Value::Str(y)) => Ok(x == y),
        (Value::Arr(xs), Value::Arr(ys)) => {
            if xs.len() != ys.len() {
                return Ok(false);
            }
            for (x, y) in xs.iter().zip(ys.iter()) {
                if !structural_eq(&x.force()?, &y.force()?)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Obj(x), Value::Obj(y)) => {
            if x.visible_len() != y.visible_len() {
                return Ok(false);
            }
            for (key, member) in x.visible_entries() {
                match y.get_visible(key) {
                    Some(other) => {
                        if !structural_eq(&member.value.force()?, &other.value.force()?)? {
                            return Ok(false);
                        }
                    }
                    None => return Ok(false),
                }
            }
            Ok(true)
        }
        (Value::Func(x), Value::Func(y)) => Ok(Rc::ptr_eq(x, y)),
        _ => Ok(false),
    }
}

/// Ordering is defined only within one of {Num, Str, Bool}; anything else
/// is the fatal per-kind error used by `orderBy`, `max`, `min` and friends.
pub fn compare_scalars(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::Num(x), Value::Num(y)) => Ok(x.total_cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::Num(_), other) | (Value::Str(_), other) | (Value::Bool(_), other) => {
            Err(Error::OrderKind {
                kind: other.pretty_name().to_string(),
            })
        }
        (other, _) => Err(Error::OrderKind {
            kind: other.pretty_name().to_string(),
        }),
    }
}

/// Whether a double holds an integral value. The variant carries no
/// integer/decimal distinction; this derives it from `ceil == floor`.
pub fn num_is_integer(n: f64) -> bool {
    n.is_finite() && n.ceil() == n.floor()
}

/// Render a number the way coercing operations (`combine`, `joinBy`,
/// `toString`) do: integers without a fractional part, everything else via
/// default double formatting.
pub fn render_num(n: f64) -> String {
    if num_is_integer(n) && n.abs() < 9.007_199_254_740_992e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A single-assignment lazy cell: either a suspended computation or the
/// memoized value it produced. Evaluation is single-threaded, so a plain
/// `RefCell` is sufficient.
#[derive(Clone)]
pub struct Thunk(Rc<RefCell<ThunkState>>);

enum ThunkState {
    Forced(Value),
    Pending(Rc<dyn Fn() -> Result<Value>>),
    InFlight,
}

impl Thunk {
    pub fn forced(value: Value) -> Thunk {
        Thunk(Rc::new(RefCell::new(ThunkState::Forced(value))))
    }

    pub fn suspend(f: impl Fn() -> Result<Value> + 'static) -> Thunk {
        Thunk(Rc::new(RefCell::new(ThunkState::Pending(Rc::new(f)))))
    }

    /// Force the cell: evaluate on first demand, memoize, and return the
    /// cached value on every later force.
    pub fn force(&self) -> Result<Value> {
        let taken = std::mem::replace(&mut *self.0.borrow_mut(), ThunkState::InFlight);
        match taken {
            ThunkState::Forced(value) => {
                *self.0.borrow_mut() = ThunkState::Forced(value.clone());
                Ok(value)
            }
            ThunkState::InFlight => {
                Err(Error::eval("Value depends on itself during evaluation"))
            }
            ThunkState::Pending(f) => {
                // the cell stays InFlight while the closure runs, so a
                // self-referential force is caught instead of recursing
                let value = f()?;
                *self.0.borrow_mut() = ThunkState::Forced(value.clone());
                Ok(value)
            }
        }
    }

    /// Whether the cell has already been forced. Observable laziness is part
    /// of the contract, so tests peek at this.
    pub fn is_forced(&self) -> bool {
        matches!(&*self.0.borrow(), ThunkState::Forced(_))
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.borrow() {
            ThunkState::Forced(value) => value.fmt(f),
            ThunkState::Pending(_) | ThunkState::InFlight => write!(f, "<lazy>"),
        }
    }
}

/// Member visibility: Hidden members are skipped by all iteration and
/// serialization; Unconditional members survive object merging unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Normal,
    Hidden,
    Unconditional,
}

#[derive(Clone)]
pub struct Member {
    pub visibility: Visibility,
    pub value: Thunk,
}

impl Member {
    pub fn new(visibility: Visibility, value: Thunk) -> Member {
        Member { visibility, value }
    }

    pub fn normal(value: Thunk) -> Member {
        Member::new(Visibility::Normal, value)
    }

    pub fn is_visible(&self) -> bool {
        self.visibility != Visibility::Hidden
    }
}

/// An insertion-ordered mapping from string keys to members. Visible-key
/// iteration order is observable and must survive every derived object.
#[derive(Clone, Default)]
pub struct Object {
    members: IndexMap<String, Member>,
}

impl Object {
    pub fn new() -> Object {
        Object::default()
    }

    /// Insert or replace a member. Replacing keeps the key's original
    /// insertion position, matching the merge semantics of `mapObject`.
    pub fn insert(&mut self, key: impl Into<String>, member: Member) {
        self.members.insert(key.into(), member);
    }

    /// Lookup regardless of visibility (field access reaches Hidden members).
    pub fn get(&self, key: &str) -> Option<&Member> {
        self.members.get(key)
    }

    pub fn get_visible(&self, key: &str) -> Option<&Member> {
        self.members.get(key).filter(|m| m.is_visible())
    }

    pub fn visible_entries(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members
            .iter()
            .filter(|(_, m)| m.is_visible())
            .map(|(k, m)| (k.as_str(), m))
    }

    pub fn visible_keys(&self) -> impl Iterator<Item = &str> {
        self.visible_entries().map(|(k, _)| k)
    }

    pub fn visible_len(&self) -> usize {
        self.visible_entries().count()
    }

    pub fn contains_visible(&self, key: &str) -> bool {
        self.get_visible(key).is_some()
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Object {
        let mut obj = Object::new();
        for (key, value) in iter {
            obj.insert(key, Member::normal(Thunk::forced(value)));
        }
        obj
    }
}

/// A callable closure. The declared parameter names are introspectable;
/// combinators branch on their count to pick a call shape.
pub struct Function {
    params: Vec<String>,
    pub body: FuncBody,
}

pub enum FuncBody {
    /// A user function: an expression body plus its captured lexical scope.
    Expr {
        body: Rc<crate::eval::Expr>,
        env: crate::eval::Scope,
    },
    /// A built-in installed by the standard library or the engine.
    Native(Rc<dyn Fn(&[Value]) -> Result<Value>>),
}

impl Function {
    pub fn new(params: Vec<String>, body: FuncBody) -> Function {
        Function { params, body }
    }

    pub fn native(
        params: &[&str],
        f: impl Fn(&[Value]) -> Result<Value> + 'static,
    ) -> Function {
        Function {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: FuncBody::Native(Rc::new(f)),
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_pretty_names() {
        assert_eq!(Value::Null.pretty_name(), "null");
        assert_eq!(Value::Bool(true).pretty_name(), "boolean");
        assert_eq!(Value::Num(1.0).pretty_name(), "number");
        assert_eq!(Value::string("x").pretty_name(), "string");
        assert_eq!(Value::array(vec![]).pretty_name(), "array");
        assert_eq!(Value::object(Object::new()).pretty_name(), "object");
    }

    #[test]
    fn test_thunk_forces_once_and_memoizes() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let thunk = Thunk::suspend(move || {
            counter.set(counter.get() + 1);
            Ok(Value::Num(42.0))
        });
        assert!(!thunk.is_forced());
        assert_eq!(thunk.force().unwrap(), Value::Num(42.0));
        assert_eq!(thunk.force().unwrap(), Value::Num(42.0));
        assert_eq!(calls.get(), 1);
        assert!(thunk.is_forced());
    }

    #[test]
    fn test_structural_eq_forces_lazy_elements() {
        let lazy = Value::array_of_thunks(vec![Thunk::suspend(|| Ok(Value::Num(1.0)))]);
        let eager = Value::array(vec![Value::Num(1.0)]);
        assert!(structural_eq(&lazy, &eager).unwrap());
    }

    #[test]
    fn test_structural_eq_is_cross_variant_strict() {
        assert!(!structural_eq(&Value::Num(1.0), &Value::string("1")).unwrap());
        assert!(!structural_eq(&Value::Bool(true), &Value::Num(1.0)).unwrap());
        assert!(!structural_eq(&Value::Null, &Value::Bool(false)).unwrap());
    }

    #[test]
    fn test_object_equality_ignores_key_order() {
        let a = Value::object_from_pairs(vec![
            ("x".to_string(), Value::Num(1.0)),
            ("y".to_string(), Value::Num(2.0)),
        ]);
        let b = Value::object_from_pairs(vec![
            ("y".to_string(), Value::Num(2.0)),
            ("x".to_string(), Value::Num(1.0)),
        ]);
        assert!(structural_eq(&a, &b).unwrap());
    }

    #[test]
    fn test_hidden_members_are_invisible_but_reachable() {
        let mut obj = Object::new();
        obj.insert("a", Member::normal(Thunk::forced(Value::Num(1.0))));
        obj.insert(
            "secret",
            Member::new(Visibility::Hidden, Thunk::forced(Value::Num(2.0))),
        );
        assert_eq!(obj.visible_len(), 1);
        assert!(obj.get("secret").is_some());
        assert!(obj.get_visible("secret").is_none());
        let keys: Vec<&str> = obj.visible_keys().collect();
        assert_eq!(keys, vec!["a"]);
    }

    #[test]
    fn test_compare_scalars_rejects_mixed_kinds() {
        let err = compare_scalars(&Value::Num(1.0), &Value::string("a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected Array of type String, Boolean, or Number, got: Array of type string"
        );
        let err = compare_scalars(&Value::array(vec![]), &Value::Num(1.0)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected Array of type String, Boolean, or Number, got: Array of type array"
        );
    }

    #[test]
    fn test_render_num_integer_vs_decimal() {
        assert_eq!(render_num(5.0), "5");
        assert_eq!(render_num(-3.0), "-3");
        assert_eq!(render_num(5.5), "5.5");
        assert_eq!(render_num(0.1), "0.1");
    }

    #[test]
    fn test_num_is_integer() {
        assert!(num_is_integer(4.0));
        assert!(num_is_integer(-2.0));
        assert!(!num_is_integer(4.2));
        assert!(!num_is_integer(f64::NAN));
    }
}
