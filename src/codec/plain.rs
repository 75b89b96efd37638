//! Plain-text codec: reads the document body as a string value, writes
//! scalars with the standard coercion.

use super::{scalar_to_string, Document, DocumentReader, DocumentWriter};
use crate::error::Result;
use crate::mime::MediaType;
use crate::value::Value;

pub struct PlainReader;

impl DocumentReader for PlainReader {
    fn supported_types(&self) -> Vec<MediaType> {
        vec![MediaType::plain_text()]
    }

    fn read(&self, doc: &Document) -> Result<Value> {
        Ok(Value::string(&doc.content))
    }
}

pub struct PlainWriter;

impl DocumentWriter for PlainWriter {
    fn supported_types(&self) -> Vec<MediaType> {
        vec![MediaType::plain_text()]
    }

    fn write(&self, value: &Value, _media_type: &MediaType) -> Result<String> {
        scalar_to_string(value)
    }
}
