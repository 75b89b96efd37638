use datamorph::stdlib::StandardLibrary;
use datamorph::value::{Function, Value};
use datamorph::{Error, Result};

/// Execute a registered function by qualified name.
fn exec_fn(stdlib: &StandardLibrary, name: &str, args: &[Value]) -> Result<Value> {
    match stdlib.get_function(name) {
        Some(builtin) => (builtin.func)(args),
        None => Err(Error::eval(format!("Function {} not found", name))),
    }
}

fn num(n: f64) -> Value {
    Value::Num(n)
}

fn s(text: &str) -> Value {
    Value::string(text)
}

fn arr(items: Vec<Value>) -> Value {
    Value::array(items)
}

fn obj(pairs: Vec<(&str, Value)>) -> Value {
    Value::object_from_pairs(
        pairs
            .into_iter()
            .map(|(key, value)| (key.to_string(), value)),
    )
}

fn field(name: &'static str) -> Value {
    Value::function(Function::native(&["item"], move |args| match &args[0] {
        Value::Obj(item) => match item.get(name) {
            Some(member) => member.value.force(),
            None => Ok(Value::Null),
        },
        other => Err(Error::type_mismatch("Object", other.pretty_name())),
    }))
}

fn identity() -> Value {
    Value::function(Function::native(&["item"], |args| Ok(args[0].clone())))
}

#[test]
fn test_golden_combine() {
    let stdlib = StandardLibrary::new();
    assert_eq!(
        exec_fn(&stdlib, "combine", &[num(5.0), s("10")]).unwrap(),
        s("510")
    );
    assert_eq!(
        exec_fn(&stdlib, "combine", &[num(5.5), s(" years")]).unwrap(),
        s("5.5 years")
    );
}

#[test]
fn test_golden_group_by() {
    let stdlib = StandardLibrary::new();
    let input = arr(vec![
        obj(vec![("k", s("a")), ("v", num(1.0))]),
        obj(vec![("k", s("b")), ("v", num(2.0))]),
        obj(vec![("k", s("a")), ("v", num(3.0))]),
    ]);
    let grouped = exec_fn(&stdlib, "groupBy", &[input, field("k")]).unwrap();
    assert_eq!(
        grouped,
        obj(vec![
            (
                "a",
                arr(vec![
                    obj(vec![("k", s("a")), ("v", num(1.0))]),
                    obj(vec![("k", s("a")), ("v", num(3.0))]),
                ]),
            ),
            ("b", arr(vec![obj(vec![("k", s("b")), ("v", num(2.0))])])),
        ])
    );
}

#[test]
fn test_golden_radix() {
    let stdlib = StandardLibrary::new();
    assert_eq!(
        exec_fn(&stdlib, "numbers.fromRadixNumber", &[s("1101000"), num(2.0)]).unwrap(),
        num(104.0)
    );
    assert_eq!(
        exec_fn(&stdlib, "numbers.toRadixNumber", &[num(104.0), num(2.0)]).unwrap(),
        s("1101000")
    );
}

#[test]
fn test_golden_at_beginning_of_week() {
    let stdlib = StandardLibrary::new();
    assert_eq!(
        exec_fn(
            &stdlib,
            "datetime.atBeginningOfWeek",
            &[s("2020-12-31T23:19:35Z")]
        )
        .unwrap(),
        s("2020-12-27T00:00:00Z")
    );
}

#[test]
fn test_golden_outer_join() {
    let stdlib = StandardLibrary::new();
    let left = arr(vec![
        obj(vec![("id", num(1.0))]),
        obj(vec![("id", num(2.0))]),
        obj(vec![("id", num(3.0))]),
    ]);
    let right = arr(vec![
        obj(vec![("c", num(1.0))]),
        obj(vec![("c", num(2.0))]),
        obj(vec![("c", num(4.0))]),
    ]);
    let joined = exec_fn(
        &stdlib,
        "arrays.outerJoin",
        &[left, right, field("id"), field("c")],
    )
    .unwrap();
    match &joined {
        Value::Arr(items) => assert_eq!(items.len(), 4),
        other => panic!("expected array, got {:?}", other),
    }
    assert_eq!(
        joined,
        arr(vec![
            obj(vec![
                ("l", obj(vec![("id", num(1.0))])),
                ("r", obj(vec![("c", num(1.0))])),
            ]),
            obj(vec![
                ("l", obj(vec![("id", num(2.0))])),
                ("r", obj(vec![("c", num(2.0))])),
            ]),
            obj(vec![("l", obj(vec![("id", num(3.0))]))]),
            obj(vec![("r", obj(vec![("c", num(4.0))]))]),
        ])
    );
}

#[test]
fn test_golden_ordinalize() {
    let stdlib = StandardLibrary::new();
    assert_eq!(
        exec_fn(&stdlib, "strings.ordinalize", &[num(112.0)]).unwrap(),
        s("112th")
    );
    assert_eq!(
        exec_fn(&stdlib, "strings.ordinalize", &[num(21.0)]).unwrap(),
        s("21st")
    );
}

#[test]
fn test_property_ordering_preservation() {
    // keys(f(o)) == keys(o) for non-reordering object operations
    let stdlib = StandardLibrary::new();
    let input = obj(vec![("z", num(3.0)), ("a", num(1.0)), ("m", num(2.0))]);
    let keep_all = Value::function(Function::native(&["value"], |_| Ok(Value::Bool(true))));
    for name in ["filterObject", "distinctBy"] {
        let result = exec_fn(&stdlib, name, &[input.clone(), keep_all.clone()]).unwrap();
        match (&input, &result) {
            (Value::Obj(before), Value::Obj(after)) => {
                let expected: Vec<&str> = before.visible_keys().collect();
                let actual: Vec<&str> = after.visible_keys().collect();
                assert_eq!(actual, expected, "{} reordered keys", name);
            }
            _ => panic!("expected objects"),
        }
    }
}

#[test]
fn test_property_null_passthrough() {
    let stdlib = StandardLibrary::new();
    for name in ["map", "filter", "flatMap", "groupBy", "orderBy"] {
        assert_eq!(
            exec_fn(&stdlib, name, &[Value::Null, identity()]).unwrap(),
            Value::Null,
            "{} broke null pass-through",
            name
        );
    }
}

#[test]
fn test_property_equality_containment() {
    let stdlib = StandardLibrary::new();
    let items = vec![num(1.0), s("x"), obj(vec![("a", num(1.0))])];
    let xs = arr(items.clone());
    for item in items {
        assert_eq!(
            exec_fn(&stdlib, "contains", &[xs.clone(), item]).unwrap(),
            Value::Bool(true)
        );
    }
    assert_eq!(
        exec_fn(&stdlib, "contains", &[xs, s("1")]).unwrap(),
        Value::Bool(false)
    );
}

#[test]
fn test_property_radix_round_trips() {
    let stdlib = StandardLibrary::new();
    for n in [-1000i64, -37, -1, 0, 1, 2, 63, 64, 104, 9999] {
        for radix in [2.0, 8.0, 16.0, 36.0] {
            let rendered =
                exec_fn(&stdlib, "numbers.toRadixNumber", &[num(n as f64), num(radix)]).unwrap();
            assert_eq!(
                exec_fn(&stdlib, "numbers.fromRadixNumber", &[rendered, num(radix)]).unwrap(),
                num(n as f64),
                "round trip failed for {} radix {}",
                n,
                radix
            );
        }
    }
}

#[test]
fn test_property_case_involutions() {
    let stdlib = StandardLibrary::new();
    for input in ["Hello World", "mixed_case-input", "simple"] {
        let lower = exec_fn(&stdlib, "lower", &[s(input)]).unwrap();
        let upper_of_lower = exec_fn(&stdlib, "upper", &[lower]).unwrap();
        let upper = exec_fn(&stdlib, "upper", &[s(input)]).unwrap();
        assert_eq!(upper_of_lower, upper);
    }
}

#[test]
fn test_property_fold_duality() {
    let stdlib = StandardLibrary::new();
    let add = Value::function(Function::native(&["curr", "prev"], |args| {
        match (&args[0], &args[1]) {
            (Value::Num(a), Value::Num(b)) => Ok(num(a + b)),
            _ => Err(Error::type_mismatch("Number", "other")),
        }
    }));
    let input = arr(vec![num(1.0), num(2.0), num(3.0), num(4.0)]);
    let left = exec_fn(&stdlib, "foldLeft", &[input.clone(), num(0.0), add.clone()]).unwrap();
    let right = exec_fn(&stdlib, "foldRight", &[input, num(0.0), add]).unwrap();
    assert_eq!(left, right);
    assert_eq!(left, num(10.0));
}
