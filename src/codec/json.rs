//! JSON codec: serde_json in, serde_json out. Honors the `preserveorder`
//! parameter injected by the engine when a header says `preserveOrder=false`.

use super::{value_from_json, value_to_json, Document, DocumentReader, DocumentWriter};
use crate::error::{Error, Result};
use crate::mime::MediaType;
use crate::value::Value;

pub const PARAM_PRESERVE_ORDER: &str = "preserveorder";

pub struct JsonReader;

impl DocumentReader for JsonReader {
    fn supported_types(&self) -> Vec<MediaType> {
        vec![MediaType::json(), MediaType::new("text", "json")]
    }

    fn read(&self, doc: &Document) -> Result<Value> {
        let parsed: serde_json::Value = serde_json::from_str(&doc.content)
            .map_err(|e| Error::Codec(format!("JSON parse error: {}", e)))?;
        let preserve_order = doc
            .media_type
            .param(PARAM_PRESERVE_ORDER)
            .map(|p| p != "false")
            .unwrap_or(true);
        Ok(value_from_json(&parsed, preserve_order))
    }
}

pub struct JsonWriter;

impl DocumentWriter for JsonWriter {
    fn supported_types(&self) -> Vec<MediaType> {
        vec![MediaType::json(), MediaType::new("text", "json")]
    }

    fn write(&self, value: &Value, _media_type: &MediaType) -> Result<String> {
        let json = value_to_json(value)?;
        serde_json::to_string(&json).map_err(|e| Error::Codec(format!("JSON write error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_preserves_document_key_order() {
        let doc = Document::json(r#"{"b": 1, "a": 2}"#);
        let value = JsonReader.read(&doc).unwrap();
        let written = JsonWriter.write(&value, &MediaType::json()).unwrap();
        assert_eq!(written, r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn test_preserveorder_false_sorts_keys() {
        let doc = Document::new(
            r#"{"b": 1, "a": 2}"#,
            MediaType::json().with_param(PARAM_PRESERVE_ORDER, "false"),
        );
        let value = JsonReader.read(&doc).unwrap();
        let written = JsonWriter.write(&value, &MediaType::json()).unwrap();
        assert_eq!(written, r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_parse_error_is_codec_failure() {
        let doc = Document::json("{invalid");
        let err = JsonReader.read(&doc).unwrap_err();
        assert!(err.to_string().starts_with("JSON parse error:"));
    }

    #[test]
    fn test_scalar_documents() {
        assert_eq!(
            JsonReader.read(&Document::json("42")).unwrap(),
            Value::Num(42.0)
        );
        assert_eq!(
            JsonReader.read(&Document::json("\"hi\"")).unwrap(),
            Value::string("hi")
        );
        assert_eq!(JsonReader.read(&Document::json("null")).unwrap(), Value::Null);
    }
}
