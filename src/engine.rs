//! Transform orchestration: parse the script header, read each input
//! through the codec registry, bind the `ds` namespace and the inputs into
//! the root scope, evaluate, and serialize the result.

use crate::codec::json::PARAM_PRESERVE_ORDER;
use crate::codec::{
    value_from_json, CodecRegistry, Document, DocumentReader, DocumentWriter,
};
use crate::error::{Error, Position, Result};
use crate::eval::{eval, Expr, Scope};
use crate::header::Header;
use crate::mime::MediaType;
use crate::stdlib::common::{as_obj, as_str, coerce_scalar, expect_arg_count, expect_arg_range};
use crate::stdlib::StandardLibrary;
use crate::value::{Function, Member, Object, Thunk, Value};
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// A script: its source text (for the header block) plus the expression the
/// external compiler produced for its body.
pub struct Script {
    source: String,
    body: Rc<Expr>,
}

impl Script {
    pub fn new(source: impl Into<String>, body: Rc<Expr>) -> Script {
        Script {
            source: source.into(),
            body,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn body(&self) -> &Rc<Expr> {
        &self.body
    }

    pub fn header(&self) -> Result<Header> {
        Header::parse(&self.source)
    }
}

pub struct EngineBuilder {
    registry: CodecRegistry,
    resources: HashMap<String, String>,
    libraries: Vec<(String, Value)>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        EngineBuilder::new()
    }
}

impl EngineBuilder {
    pub fn new() -> EngineBuilder {
        EngineBuilder {
            registry: CodecRegistry::with_defaults(),
            resources: HashMap::new(),
            libraries: Vec::new(),
        }
    }

    /// Replace the default codec set entirely.
    pub fn with_registry(mut self, registry: CodecRegistry) -> EngineBuilder {
        self.registry = registry;
        self
    }

    pub fn with_reader(mut self, reader: Box<dyn DocumentReader>) -> EngineBuilder {
        self.registry.register_reader(reader);
        self
    }

    pub fn with_writer(mut self, writer: Box<dyn DocumentWriter>) -> EngineBuilder {
        self.registry.register_writer(writer);
        self
    }

    /// Register an embedded resource served by `readUrl("classpath://...")`.
    pub fn with_resource(
        mut self,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> EngineBuilder {
        self.resources.insert(name.into(), content.into());
        self
    }

    /// Merge a named extension object into the `ds` namespace.
    pub fn with_library(mut self, name: impl Into<String>, library: Value) -> EngineBuilder {
        self.libraries.push((name.into(), library));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            registry: Rc::new(self.registry),
            resources: Rc::new(self.resources),
            stdlib: StandardLibrary::new(),
            libraries: self.libraries,
        }
    }
}

pub struct Engine {
    registry: Rc<CodecRegistry>,
    resources: Rc<HashMap<String, String>>,
    stdlib: StandardLibrary,
    libraries: Vec<(String, Value)>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Engine {
        EngineBuilder::new().build()
    }

    /// Run a transformation. The `output` argument overrides any `output`
    /// header declaration; with neither, the result is JSON.
    pub fn transform(
        &self,
        script: &Script,
        inputs: Vec<(String, Document)>,
        output: Option<MediaType>,
    ) -> Result<Document> {
        self.transform_at(script, inputs, output, None)
    }

    /// Like `transform`, attaching a caller-supplied source position to any
    /// error that escapes.
    pub fn transform_at(
        &self,
        script: &Script,
        inputs: Vec<(String, Document)>,
        output: Option<MediaType>,
        position: Option<Position>,
    ) -> Result<Document> {
        let result = self.run(script, inputs, output);
        match (result, position) {
            (Err(err), Some(position)) => Err(err.at(position)),
            (other, _) => other,
        }
    }

    fn run(
        &self,
        script: &Script,
        inputs: Vec<(String, Document)>,
        output: Option<MediaType>,
    ) -> Result<Document> {
        let header = script.header()?;
        debug!("transform start: {} input(s)", inputs.len());

        let mut scope = Scope::root().bind("ds", Thunk::forced(self.build_namespace()));
        for (name, doc) in inputs {
            // a wildcard document type defers to the header's declaration
            let doc_type = if doc.media_type.same_index(&MediaType::any()) {
                header.default_input_for(&name).unwrap_or_else(MediaType::json)
            } else {
                doc.media_type.clone()
            };
            let mut merged = header.combine_input_params(&name, &doc_type);
            if !header.preserve_order() {
                merged = merged.with_param(PARAM_PRESERVE_ORDER, "false");
            }
            let value = self
                .registry
                .read(&Document::new(doc.content, merged))?;
            scope = scope.bind(name, Thunk::forced(value));
        }

        let result = eval(script.body(), &scope)?;

        let requested = match output {
            Some(requested) => requested,
            None => {
                let declared = header.default_output();
                if declared == MediaType::any() {
                    MediaType::json()
                } else {
                    declared
                }
            }
        };
        let merged = header.combine_output_params(&requested);
        let written = self.registry.write(&result, &merged)?;
        debug!("transform finished as {}", written.media_type);
        Ok(written)
    }

    /// Build the `ds` object: root builtins as members, namespaces as nested
    /// objects, plus `read`/`write`/`readUrl` closing over the registry, and
    /// any caller-registered extension libraries.
    fn build_namespace(&self) -> Value {
        let mut root = Object::new();
        let mut modules: BTreeMap<&str, Object> = BTreeMap::new();

        for name in self.stdlib.function_names() {
            let builtin = match self.stdlib.get_function(name) {
                Some(builtin) => *builtin,
                None => continue,
            };
            let func = builtin.func;
            let wrapped = Value::function(Function::native(builtin.params, move |args| {
                func(args)
            }));
            match name.split_once('.') {
                None => root.insert(name.as_str(), Member::normal(Thunk::forced(wrapped))),
                Some((module, entry)) => {
                    modules
                        .entry(module)
                        .or_default()
                        .insert(entry, Member::normal(Thunk::forced(wrapped)));
                }
            }
        }

        root.insert("read", Member::normal(Thunk::forced(self.read_builtin())));
        root.insert("write", Member::normal(Thunk::forced(self.write_builtin())));
        root.insert(
            "readUrl",
            Member::normal(Thunk::forced(self.read_url_builtin())),
        );

        for (module, members) in modules {
            root.insert(module, Member::normal(Thunk::forced(Value::object(members))));
        }
        for (name, library) in &self.libraries {
            root.insert(name.as_str(), Member::normal(Thunk::forced(library.clone())));
        }
        Value::object(root)
    }

    fn read_builtin(&self) -> Value {
        let registry = Rc::clone(&self.registry);
        Value::function(Function::native(&["data", "mimeType", "params"], move |args| {
            expect_arg_range(args, 2, 3)?;
            let data = as_str(&args[0])?.to_string();
            let media_type = media_type_with_params(&args[1], args.get(2))?;
            registry.read(&Document::new(data, media_type))
        }))
    }

    fn write_builtin(&self) -> Value {
        let registry = Rc::clone(&self.registry);
        Value::function(Function::native(&["value", "mimeType", "params"], move |args| {
            expect_arg_range(args, 2, 3)?;
            let media_type = media_type_with_params(&args[1], args.get(2))?;
            let written = registry.write(&args[0], &media_type)?;
            Ok(Value::string(written.content))
        }))
    }

    fn read_url_builtin(&self) -> Value {
        let resources = Rc::clone(&self.resources);
        Value::function(Function::native(&["url"], move |args| {
            expect_arg_count(args, 1)?;
            let target = as_str(&args[0])?;
            let body = if let Some(resource) = target.strip_prefix("classpath://") {
                // a missing embedded resource reads as the string "null"
                resources
                    .get(resource)
                    .cloned()
                    .unwrap_or_else(|| "null".to_string())
            } else {
                let parsed = url::Url::parse(target)
                    .map_err(|e| Error::Domain(format!("Invalid URL {}: {}", target, e)))?;
                fetch_url(parsed.as_str())?
            };
            let json: serde_json::Value = serde_json::from_str(&body)
                .map_err(|e| Error::Codec(format!("JSON parse error: {}", e)))?;
            Ok(value_from_json(&json, true))
        }))
    }
}

fn fetch_url(target: &str) -> Result<String> {
    let response = reqwest::blocking::get(target)
        .map_err(|e| Error::Domain(format!("Could not read URL {}: {}", target, e)))?;
    response
        .text()
        .map_err(|e| Error::Domain(format!("Could not read URL {}: {}", target, e)))
}

/// `read`/`write` accept an optional params object whose scalar members are
/// layered onto the parsed media type.
fn media_type_with_params(mime: &Value, params: Option<&Value>) -> Result<MediaType> {
    let mut media_type = MediaType::parse(as_str(mime)?)?;
    if let Some(params) = params {
        if !params.is_null() {
            let obj = as_obj(params)?;
            for (key, member) in obj.visible_entries() {
                media_type = media_type.with_param(key, coerce_scalar(&member.value.force()?)?);
            }
        }
    }
    Ok(media_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::apply;

    fn ds_entry(engine: &Engine, path: &[&str]) -> Value {
        let mut current = engine.build_namespace();
        for segment in path {
            current = match &current {
                Value::Obj(obj) => obj.get(segment).unwrap().value.force().unwrap(),
                other => panic!("expected object at {}, got {:?}", segment, other),
            };
        }
        current
    }

    #[test]
    fn test_namespace_has_root_and_module_entries() {
        let engine = Engine::new();
        assert!(matches!(ds_entry(&engine, &["filter"]), Value::Func(_)));
        assert!(matches!(ds_entry(&engine, &["strings"]), Value::Obj(_)));
        assert!(matches!(
            ds_entry(&engine, &["strings", "camelize"]),
            Value::Func(_)
        ));
        assert!(matches!(ds_entry(&engine, &["read"]), Value::Func(_)));
    }

    #[test]
    fn test_namespace_functions_are_applicable() {
        let engine = Engine::new();
        let upper = match ds_entry(&engine, &["upper"]) {
            Value::Func(func) => func,
            other => panic!("expected function, got {:?}", other),
        };
        assert_eq!(
            apply(&upper, &[Value::string("abc")]).unwrap(),
            Value::string("ABC")
        );
    }

    #[test]
    fn test_read_builtin_goes_through_registry() {
        let engine = Engine::new();
        let read = match ds_entry(&engine, &["read"]) {
            Value::Func(func) => func,
            other => panic!("expected function, got {:?}", other),
        };
        let value = apply(
            &read,
            &[Value::string("[1,2]"), Value::string("application/json")],
        )
        .unwrap();
        assert_eq!(value, Value::array(vec![Value::Num(1.0), Value::Num(2.0)]));
    }

    #[test]
    fn test_read_url_classpath_and_missing_resource() {
        let engine = EngineBuilder::new()
            .with_resource("data.json", r#"{"a": 1}"#)
            .build();
        let read_url = match ds_entry(&engine, &["readUrl"]) {
            Value::Func(func) => func,
            other => panic!("expected function, got {:?}", other),
        };
        let value = apply(&read_url, &[Value::string("classpath://data.json")]).unwrap();
        assert_eq!(
            value,
            Value::object_from_pairs(vec![("a".to_string(), Value::Num(1.0))])
        );
        // missing resources read as the string "null", then JSON-parse
        let missing = apply(&read_url, &[Value::string("classpath://nope.json")]).unwrap();
        assert_eq!(missing, Value::Null);
    }

    #[test]
    fn test_library_extension_lands_in_namespace() {
        let library = Value::object_from_pairs(vec![(
            "answer".to_string(),
            Value::Num(42.0),
        )]);
        let engine = EngineBuilder::new().with_library("extras", library).build();
        assert_eq!(ds_entry(&engine, &["extras", "answer"]), Value::Num(42.0));
    }
}
