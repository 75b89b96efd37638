//! The format boundary: documents, reader/writer capability traits, and the
//! registry that matches media types to plugins.

pub mod csv;
pub mod json;
pub mod plain;
pub mod xml;

use crate::error::{Error, Result};
use crate::mime::MediaType;
use crate::value::{render_num, Thunk, Value};
use log::debug;
use serde_json::Value as JsonValue;

/// A typed document: raw content plus the media type describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub content: String,
    pub media_type: MediaType,
}

impl Document {
    pub fn new(content: impl Into<String>, media_type: MediaType) -> Document {
        Document {
            content: content.into(),
            media_type,
        }
    }

    pub fn json(content: impl Into<String>) -> Document {
        Document::new(content, MediaType::json())
    }
}

/// Capability: read documents of the advertised media types into values.
pub trait DocumentReader {
    fn supported_types(&self) -> Vec<MediaType>;
    fn read(&self, doc: &Document) -> Result<Value>;
}

/// Capability: write values out as documents of the advertised media types.
pub trait DocumentWriter {
    fn supported_types(&self) -> Vec<MediaType>;
    fn write(&self, value: &Value, media_type: &MediaType) -> Result<String>;
}

/// Immutable after construction; selection matches on `(type, subtype)` and
/// falls back in registration order.
pub struct CodecRegistry {
    readers: Vec<Box<dyn DocumentReader>>,
    writers: Vec<Box<dyn DocumentWriter>>,
}

impl CodecRegistry {
    pub fn empty() -> CodecRegistry {
        CodecRegistry {
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// The built-in plugin set: JSON, CSV, XML, and plain text.
    pub fn with_defaults() -> CodecRegistry {
        let mut registry = CodecRegistry::empty();
        registry.register_reader(Box::new(json::JsonReader));
        registry.register_writer(Box::new(json::JsonWriter));
        registry.register_reader(Box::new(csv::CsvReader));
        registry.register_writer(Box::new(csv::CsvWriter));
        registry.register_reader(Box::new(xml::XmlReader));
        registry.register_writer(Box::new(xml::XmlWriter));
        registry.register_reader(Box::new(plain::PlainReader));
        registry.register_writer(Box::new(plain::PlainWriter));
        registry
    }

    pub fn register_reader(&mut self, reader: Box<dyn DocumentReader>) {
        self.readers.push(reader);
    }

    pub fn register_writer(&mut self, writer: Box<dyn DocumentWriter>) {
        self.writers.push(writer);
    }

    pub fn read(&self, doc: &Document) -> Result<Value> {
        let reader = self
            .readers
            .iter()
            .find(|candidate| {
                candidate
                    .supported_types()
                    .iter()
                    .any(|supported| supported.same_index(&doc.media_type))
            })
            .ok_or_else(|| Error::CodecNotFound {
                kind: doc.media_type.kind().to_string(),
                subtype: doc.media_type.subtype().to_string(),
            })?;
        debug!("reading document as {}", doc.media_type);
        reader.read(doc)
    }

    pub fn write(&self, value: &Value, media_type: &MediaType) -> Result<Document> {
        let writer = self
            .writers
            .iter()
            .find(|candidate| {
                candidate
                    .supported_types()
                    .iter()
                    .any(|supported| supported.same_index(media_type))
            })
            .ok_or_else(|| Error::CodecNotFound {
                kind: media_type.kind().to_string(),
                subtype: media_type.subtype().to_string(),
            })?;
        debug!("writing result as {}", media_type);
        let content = writer.write(value, media_type)?;
        Ok(Document::new(content, media_type.clone()))
    }
}

/// Force a value into the serde_json bridge representation. Functions have
/// no serialized form and are rejected.
pub fn value_to_json(value: &Value) -> Result<JsonValue> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::Num(n) => {
            if crate::value::num_is_integer(*n) && n.abs() < 9.007_199_254_740_992e15 {
                Ok(JsonValue::Number((*n as i64).into()))
            } else {
                serde_json::Number::from_f64(*n)
                    .map(JsonValue::Number)
                    .ok_or_else(|| Error::Codec(format!("Cannot serialize number: {}", render_num(*n))))
            }
        }
        Value::Str(s) => Ok(JsonValue::String(s.to_string())),
        Value::Arr(items) => {
            let mut array = Vec::with_capacity(items.len());
            for item in items.iter() {
                array.push(value_to_json(&item.force()?)?);
            }
            Ok(JsonValue::Array(array))
        }
        Value::Obj(obj) => {
            let mut map = serde_json::Map::new();
            for (key, member) in obj.visible_entries() {
                map.insert(key.to_string(), value_to_json(&member.value.force()?)?);
            }
            Ok(JsonValue::Object(map))
        }
        Value::Func(_) => Err(Error::type_mismatch("a serializable value", "function")),
    }
}

/// Lift a serde_json value into the engine's value model. When
/// `preserve_order` is false object keys are sorted instead of kept in
/// document order.
pub fn value_from_json(json: &JsonValue, preserve_order: bool) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => Value::Num(n.as_f64().unwrap_or(0.0)),
        JsonValue::String(s) => Value::string(s),
        JsonValue::Array(items) => Value::array_of_thunks(
            items
                .iter()
                .map(|item| Thunk::forced(value_from_json(item, preserve_order)))
                .collect(),
        ),
        JsonValue::Object(map) => {
            let mut entries: Vec<(&String, &JsonValue)> = map.iter().collect();
            if !preserve_order {
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            }
            Value::object_from_pairs(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), value_from_json(value, preserve_order))),
            )
        }
    }
}

/// The scalar coercion shared by the CSV and plain-text writers.
pub fn scalar_to_string(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Num(n) => Ok(render_num(*n)),
        Value::Str(s) => Ok(s.to_string()),
        other => Err(Error::Codec(format!(
            "Cannot render {} as text",
            other.pretty_name()
        ))),
    }
}
