use datamorph::engine::{Engine, EngineBuilder, Script};
use datamorph::eval::{Expr, Field, FieldName};
use datamorph::mime::MediaType;
use datamorph::value::Visibility;
use datamorph::Document;
use std::rc::Rc;

fn rc(expr: Expr) -> Rc<Expr> {
    Rc::new(expr)
}

fn var(name: &str) -> Rc<Expr> {
    rc(Expr::Var(name.to_string()))
}

fn field(target: Rc<Expr>, name: &str) -> Rc<Expr> {
    rc(Expr::Index {
        target,
        index: rc(Expr::Str(name.to_string())),
    })
}

/// ds.<name>(args...) as an expression
fn ds_call(path: &[&str], args: Vec<Rc<Expr>>) -> Rc<Expr> {
    let mut target = var("ds");
    for segment in path {
        target = field(target, segment);
    }
    rc(Expr::Apply { target, args })
}

fn func(params: &[&str], body: Rc<Expr>) -> Rc<Expr> {
    rc(Expr::Function {
        params: params.iter().map(|p| p.to_string()).collect(),
        body,
    })
}

fn object(fields: Vec<(&str, Rc<Expr>)>) -> Rc<Expr> {
    rc(Expr::Object(
        fields
            .into_iter()
            .map(|(name, value)| Field {
                name: FieldName::Fixed(name.to_string()),
                visibility: Visibility::Normal,
                value,
            })
            .collect(),
    ))
}

#[test]
fn test_identity_transform_preserves_key_order() {
    let engine = Engine::new();
    let script = Script::new("payload", var("payload"));
    let result = engine
        .transform(
            &script,
            vec![(
                "payload".to_string(),
                Document::json(r#"{"z": 1, "a": {"y": 2, "b": 3}}"#),
            )],
            None,
        )
        .unwrap();
    assert_eq!(result.content, r#"{"z":1,"a":{"y":2,"b":3}}"#);
    assert_eq!(result.media_type, MediaType::json());
}

#[test]
fn test_preserve_order_false_sorts_input_keys() {
    let source = "/** DataSonnet\npreserveOrder=false\n*/\npayload";
    let engine = Engine::new();
    let script = Script::new(source, var("payload"));
    let result = engine
        .transform(
            &script,
            vec![("payload".to_string(), Document::json(r#"{"z": 1, "a": 2}"#))],
            None,
        )
        .unwrap();
    assert_eq!(result.content, r#"{"a":2,"z":1}"#);
}

#[test]
fn test_transform_maps_over_payload() {
    // ds.map(payload, function(item) {name: ds.upper(item.name)})
    let body = ds_call(
        &["map"],
        vec![
            var("payload"),
            func(
                &["item"],
                object(vec![(
                    "name",
                    ds_call(&["upper"], vec![field(var("item"), "name")]),
                )]),
            ),
        ],
    );
    let engine = Engine::new();
    let script = Script::new("payload", body);
    let result = engine
        .transform(
            &script,
            vec![(
                "payload".to_string(),
                Document::json(r#"[{"name": "alice"}, {"name": "bob"}]"#),
            )],
            None,
        )
        .unwrap();
    assert_eq!(result.content, r#"[{"name":"ALICE"},{"name":"BOB"}]"#);
}

#[test]
fn test_csv_input_with_header_parameters() {
    let source = "/** DataSonnet\ninput payload application/csv;separator=|\n*/\npayload";
    let engine = Engine::new();
    let script = Script::new(source, var("payload"));
    let result = engine
        .transform(
            &script,
            vec![(
                "payload".to_string(),
                Document::new("name|age\nAlice|30\n", MediaType::csv()),
            )],
            None,
        )
        .unwrap();
    assert_eq!(result.content, r#"[{"name":"Alice","age":"30"}]"#);
}

#[test]
fn test_output_override_beats_header_declaration() {
    let source = "/** DataSonnet\noutput application/json\n*/\npayload";
    let engine = Engine::new();
    let script = Script::new(source, var("payload"));
    let result = engine
        .transform(
            &script,
            vec![(
                "payload".to_string(),
                Document::json(r#"[{"name":"Alice","age":30}]"#),
            )],
            Some(MediaType::csv()),
        )
        .unwrap();
    assert_eq!(result.content, "name,age\nAlice,30\n");
    assert_eq!(result.media_type, MediaType::csv());
}

#[test]
fn test_header_output_declaration_applies() {
    let source = "/** DataSonnet\noutput text/plain\n*/\npayload";
    let engine = Engine::new();
    let script = Script::new(source, var("payload"));
    let result = engine
        .transform(
            &script,
            vec![("payload".to_string(), Document::json("\"hello\""))],
            None,
        )
        .unwrap();
    assert_eq!(result.content, "hello");
    assert_eq!(result.media_type.subtype(), "plain");
}

#[test]
fn test_xml_round_trip_through_engine() {
    let source = "/** DataSonnet\ninput payload application/xml\noutput application/xml\n*/\npayload";
    let engine = Engine::new();
    let script = Script::new(source, var("payload"));
    let result = engine
        .transform(
            &script,
            vec![(
                "payload".to_string(),
                Document::new(
                    r#"<order id="7"><sku>ABC</sku></order>"#,
                    MediaType::xml(),
                ),
            )],
            None,
        )
        .unwrap();
    assert_eq!(result.content, r#"<order id="7"><sku>ABC</sku></order>"#);
}

#[test]
fn test_named_side_inputs_are_bound() {
    // ds.objects.mergeWith(payload, extra)
    let body = ds_call(&["objects", "mergeWith"], vec![var("payload"), var("extra")]);
    let engine = Engine::new();
    let script = Script::new("payload", body);
    let result = engine
        .transform(
            &script,
            vec![
                ("payload".to_string(), Document::json(r#"{"a": 1}"#)),
                ("extra".to_string(), Document::json(r#"{"b": 2}"#)),
            ],
            None,
        )
        .unwrap();
    assert_eq!(result.content, r#"{"a":1,"b":2}"#);
}

#[test]
fn test_unknown_output_mime_type_error() {
    let engine = Engine::new();
    let script = Script::new("payload", var("payload"));
    let err = engine
        .transform(
            &script,
            vec![("payload".to_string(), Document::json("1"))],
            Some(MediaType::parse("application/yaml").unwrap()),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "No suitable plugin found for mime type: application/yaml"
    );
}

#[test]
fn test_malformed_header_is_fatal() {
    let engine = Engine::new();
    let script = Script::new("/** DataSonnet\nnot a directive\n*/\npayload", var("payload"));
    let err = engine
        .transform(
            &script,
            vec![("payload".to_string(), Document::json("1"))],
            None,
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Unable to parse header line: not a directive");
}

#[test]
fn test_error_carries_caller_position() {
    use datamorph::Position;
    let engine = Engine::new();
    let script = Script::new("payload", var("missing"));
    let err = engine
        .transform_at(
            &script,
            vec![("payload".to_string(), Document::json("1"))],
            None,
            Some(Position { line: 4, column: 2 }),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unbound variable: missing at line 4 column 2"
    );
}

#[test]
fn test_read_write_builtins_inside_a_script() {
    // ds.read(payload, "application/csv;separator=|")
    let body = ds_call(
        &["read"],
        vec![
            var("payload"),
            rc(Expr::Str("application/csv;separator=|".to_string())),
        ],
    );
    let engine = Engine::new();
    let script = Script::new("payload", body);
    let result = engine
        .transform(
            &script,
            vec![(
                "payload".to_string(),
                Document::new("a|b\n1|2\n", MediaType::plain_text()),
            )],
            None,
        )
        .unwrap();
    assert_eq!(result.content, r#"[{"a":"1","b":"2"}]"#);
}

#[test]
fn test_classpath_resource_through_script() {
    let body = ds_call(
        &["readUrl"],
        vec![rc(Expr::Str("classpath://lookup.json".to_string()))],
    );
    let engine = EngineBuilder::new()
        .with_resource("lookup.json", r#"{"rate": 2}"#)
        .build();
    let script = Script::new("payload", body);
    let result = engine
        .transform(
            &script,
            vec![("payload".to_string(), Document::json("1"))],
            None,
        )
        .unwrap();
    assert_eq!(result.content, r#"{"rate":2}"#);
}

#[test]
fn test_projection_keeps_untouched_fields_out_of_the_output() {
    let body = object(vec![("picked", field(var("payload"), "a"))]);
    let engine = Engine::new();
    let script = Script::new("payload", body);
    let result = engine
        .transform(
            &script,
            vec![(
                "payload".to_string(),
                Document::json(r#"{"a": 1, "b": {"deep": [1, 2, 3]}}"#),
            )],
            None,
        )
        .unwrap();
    assert_eq!(result.content, r#"{"picked":1}"#);
}
