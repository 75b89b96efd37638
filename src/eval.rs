//! The tree-walking evaluator: the `Expr` AST produced by the external
//! script compiler, persistent lexical scopes, and function application.
//!
//! Evaluation is single-threaded, deterministic, and lazy: array elements,
//! object members, and function arguments become thunks that capture their
//! defining scope and are only evaluated when demanded.

use crate::error::{Error, Result};
use crate::value::{
    compare_scalars, render_num, structural_eq, FuncBody, Function, Member, Object, Thunk, Value,
    Visibility,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub enum Expr {
    Null,
    True,
    False,
    Num(f64),
    Str(String),
    Var(String),
    Array(Vec<Rc<Expr>>),
    Object(Vec<Field>),
    Local {
        binds: Vec<(String, Rc<Expr>)>,
        body: Rc<Expr>,
    },
    If {
        cond: Rc<Expr>,
        then_branch: Rc<Expr>,
        else_branch: Option<Rc<Expr>>,
    },
    Function {
        params: Vec<String>,
        body: Rc<Expr>,
    },
    Apply {
        target: Rc<Expr>,
        args: Vec<Rc<Expr>>,
    },
    Index {
        target: Rc<Expr>,
        index: Rc<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Rc<Expr>,
        rhs: Rc<Expr>,
    },
    Unary {
        op: UnOp,
        expr: Rc<Expr>,
    },
    /// `error <expr>`: evaluates its message and aborts the transformation.
    Error(Rc<Expr>),
}

#[derive(Debug)]
pub struct Field {
    pub name: FieldName,
    pub visibility: Visibility,
    pub value: Rc<Expr>,
}

#[derive(Debug)]
pub enum FieldName {
    Fixed(String),
    /// Computed names are evaluated eagerly at construction time.
    Computed(Rc<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

/// An immutable chain of binding frames. A frame is filled while its binding
/// group is being constructed (so `local` groups can be mutually recursive)
/// and is read-only afterwards; sharing frames between closures is safe.
#[derive(Clone, Default)]
pub struct Scope(Option<Rc<Frame>>);

struct Frame {
    vars: RefCell<HashMap<String, Thunk>>,
    parent: Scope,
}

impl Scope {
    pub fn root() -> Scope {
        Scope(None)
    }

    fn child(&self) -> Scope {
        Scope(Some(Rc::new(Frame {
            vars: RefCell::new(HashMap::new()),
            parent: self.clone(),
        })))
    }

    fn insert(&self, name: impl Into<String>, thunk: Thunk) {
        if let Some(frame) = &self.0 {
            frame.vars.borrow_mut().insert(name.into(), thunk);
        }
    }

    pub fn bind(&self, name: impl Into<String>, thunk: Thunk) -> Scope {
        let scope = self.child();
        scope.insert(name, thunk);
        scope
    }

    pub fn bind_all(&self, binds: impl IntoIterator<Item = (String, Thunk)>) -> Scope {
        let scope = self.child();
        for (name, thunk) in binds {
            scope.insert(name, thunk);
        }
        scope
    }

    pub fn lookup(&self, name: &str) -> Option<Thunk> {
        let mut current = self;
        while let Some(frame) = &current.0 {
            if let Some(thunk) = frame.vars.borrow().get(name) {
                return Some(thunk.clone());
            }
            current = &frame.parent;
        }
        None
    }
}

pub fn eval(expr: &Rc<Expr>, scope: &Scope) -> Result<Value> {
    match expr.as_ref() {
        Expr::Null => Ok(Value::Null),
        Expr::True => Ok(Value::Bool(true)),
        Expr::False => Ok(Value::Bool(false)),
        Expr::Num(n) => Ok(Value::Num(*n)),
        Expr::Str(s) => Ok(Value::string(s)),
        Expr::Var(name) => match scope.lookup(name) {
            Some(thunk) => thunk.force(),
            None => Err(Error::UnboundVariable(name.clone())),
        },
        Expr::Array(elements) => {
            let thunks = elements
                .iter()
                .map(|element| suspend(element, scope))
                .collect();
            Ok(Value::array_of_thunks(thunks))
        }
        Expr::Object(fields) => {
            let mut obj = Object::new();
            for field in fields {
                let key = match &field.name {
                    FieldName::Fixed(name) => name.clone(),
                    FieldName::Computed(name_expr) => match eval(name_expr, scope)? {
                        Value::Str(s) => s.to_string(),
                        other => {
                            return Err(Error::type_mismatch("string", other.pretty_name()))
                        }
                    },
                };
                obj.insert(key, Member::new(field.visibility, suspend(&field.value, scope)));
            }
            Ok(Value::object(obj))
        }
        Expr::Local { binds, body } => {
            let local = scope.child();
            for (name, bound) in binds {
                local.insert(name.clone(), suspend(bound, &local));
            }
            eval(body, &local)
        }
        Expr::If {
            cond,
            then_branch,
            else_branch,
        } => match eval(cond, scope)? {
            Value::Bool(true) => eval(then_branch, scope),
            Value::Bool(false) => match else_branch {
                Some(branch) => eval(branch, scope),
                None => Ok(Value::Null),
            },
            other => Err(Error::type_mismatch("boolean", other.pretty_name())),
        },
        Expr::Function { params, body } => Ok(Value::function(Function::new(
            params.clone(),
            FuncBody::Expr {
                body: Rc::clone(body),
                env: scope.clone(),
            },
        ))),
        Expr::Apply { target, args } => {
            let callee = eval(target, scope)?;
            let func = match &callee {
                Value::Func(func) => Rc::clone(func),
                other => return Err(Error::type_mismatch("function", other.pretty_name())),
            };
            let arg_thunks = args.iter().map(|arg| suspend(arg, scope)).collect();
            apply_thunks(&func, arg_thunks)
        }
        Expr::Index { target, index } => {
            let container = eval(target, scope)?;
            let key = eval(index, scope)?;
            index_value(&container, &key)
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(*op, lhs, rhs, scope),
        Expr::Unary { op, expr } => {
            let value = eval(expr, scope)?;
            match (op, value) {
                (UnOp::Neg, Value::Num(n)) => Ok(Value::Num(-n)),
                (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (UnOp::Neg, other) => Err(Error::type_mismatch("number", other.pretty_name())),
                (UnOp::Not, other) => Err(Error::type_mismatch("boolean", other.pretty_name())),
            }
        }
        Expr::Error(message) => {
            let value = eval(message, scope)?;
            let text = match value {
                Value::Str(s) => s.to_string(),
                other => format!("{:?}", other),
            };
            Err(Error::eval(text))
        }
    }
}

fn suspend(expr: &Rc<Expr>, scope: &Scope) -> Thunk {
    let expr = Rc::clone(expr);
    let scope = scope.clone();
    Thunk::suspend(move || eval(&expr, &scope))
}

/// Invoke a `Func` value with already-forced positional arguments. This is
/// the entry point used by every combinator in the standard library.
pub fn apply(func: &Function, args: &[Value]) -> Result<Value> {
    apply_thunks(
        func,
        args.iter().cloned().map(Thunk::forced).collect(),
    )
}

pub fn apply_thunks(func: &Function, args: Vec<Thunk>) -> Result<Value> {
    match &func.body {
        FuncBody::Native(f) => {
            let mut forced = Vec::with_capacity(args.len());
            for arg in &args {
                forced.push(arg.force()?);
            }
            f(&forced)
        }
        FuncBody::Expr { body, env } => {
            if args.len() != func.arity() {
                return Err(Error::eval(format!(
                    "Function expects {} argument(s), received {}",
                    func.arity(),
                    args.len()
                )));
            }
            let scope =
                env.bind_all(func.params().iter().cloned().zip(args));
            eval(body, &scope)
        }
    }
}

fn index_value(container: &Value, key: &Value) -> Result<Value> {
    match (container, key) {
        (Value::Obj(obj), Value::Str(name)) => match obj.get(name.as_ref()) {
            Some(member) => member.value.force(),
            None => Err(Error::eval(format!("Field does not exist: {}", name))),
        },
        (Value::Arr(items), Value::Num(n)) => {
            let idx = as_index(*n, items.len())?;
            items[idx].force()
        }
        (Value::Str(s), Value::Num(n)) => {
            let chars: Vec<char> = s.chars().collect();
            let idx = as_index(*n, chars.len())?;
            Ok(Value::string(chars[idx].to_string()))
        }
        (Value::Obj(_), other) => Err(Error::type_mismatch("string", other.pretty_name())),
        (Value::Arr(_), other) | (Value::Str(_), other) => {
            Err(Error::type_mismatch("number", other.pretty_name()))
        }
        (other, _) => Err(Error::type_mismatch(
            "array, object, or string",
            other.pretty_name(),
        )),
    }
}

fn as_index(n: f64, len: usize) -> Result<usize> {
    if n.fract() != 0.0 || n < 0.0 {
        return Err(Error::Domain(format!("Invalid index: {}", render_num(n))));
    }
    let idx = n as usize;
    if idx >= len {
        return Err(Error::Domain(format!(
            "Index {} out of bounds for length {}",
            idx, len
        )));
    }
    Ok(idx)
}

fn eval_binary(op: BinOp, lhs: &Rc<Expr>, rhs: &Rc<Expr>, scope: &Scope) -> Result<Value> {
    // And/Or short-circuit before the right operand is touched.
    if let BinOp::And | BinOp::Or = op {
        let left = expect_bool(eval(lhs, scope)?)?;
        return match (op, left) {
            (BinOp::And, false) => Ok(Value::Bool(false)),
            (BinOp::Or, true) => Ok(Value::Bool(true)),
            _ => Ok(Value::Bool(expect_bool(eval(rhs, scope)?)?)),
        };
    }

    let left = eval(lhs, scope)?;
    let right = eval(rhs, scope)?;
    match op {
        BinOp::Add => add_values(&left, &right),
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            let (a, b) = (expect_num(left)?, expect_num(right)?);
            match op {
                BinOp::Sub => Ok(Value::Num(a - b)),
                BinOp::Mul => Ok(Value::Num(a * b)),
                BinOp::Div => {
                    if b == 0.0 {
                        Err(Error::Domain("Division by zero".to_string()))
                    } else {
                        Ok(Value::Num(a / b))
                    }
                }
                BinOp::Mod => {
                    if b == 0.0 {
                        Err(Error::Domain("Division by zero".to_string()))
                    } else {
                        Ok(Value::Num(a % b))
                    }
                }
                _ => unreachable!(),
            }
        }
        BinOp::Eq => Ok(Value::Bool(structural_eq(&left, &right)?)),
        BinOp::Ne => Ok(Value::Bool(!structural_eq(&left, &right)?)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = compare_scalars(&left, &right)?;
            Ok(Value::Bool(match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                BinOp::Ge => ordering.is_ge(),
                _ => unreachable!(),
            }))
        }
        BinOp::And | BinOp::Or => unreachable!(),
    }
}

/// `+` is polymorphic: numeric addition, string concatenation with
/// number/boolean coercion, array concatenation, and object merging where
/// right-hand keys win.
fn add_values(left: &Value, right: &Value) -> Result<Value> {
    match (left, right) {
        (Value::Num(a), Value::Num(b)) => Ok(Value::Num(a + b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::string(format!("{}{}", a, b))),
        (Value::Str(a), other) => Ok(Value::string(format!("{}{}", a, coerce_str(other)?))),
        (other, Value::Str(b)) => Ok(Value::string(format!("{}{}", coerce_str(other)?, b))),
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
        (a, b) => Err(Error::type_mismatch(
            "two addable values",
            format!("{} and {}", a.pretty_name(), b.pretty_name()),
        )),
    }
}

fn coerce_str(value: &Value) -> Result<String> {
    match value {
        Value::Num(n) => Ok(render_num(*n)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        other => Err(Error::type_mismatch("string", other.pretty_name())),
    }
}

fn expect_num(value: Value) -> Result<f64> {
    match value {
        Value::Num(n) => Ok(n),
        other => Err(Error::type_mismatch("number", other.pretty_name())),
    }
}

fn expect_bool(value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(Error::type_mismatch("boolean", other.pretty_name())),
    }
}
