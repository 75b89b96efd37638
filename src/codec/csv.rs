//! CSV codec over the `csv` crate. Documents with headers read as arrays of
//! objects; headerless documents (`headers=false`) read as arrays of arrays.
//! Parameters: `separator` (default `,`), `quote` (default `"`), `headers`.

use super::{scalar_to_string, Document, DocumentReader, DocumentWriter};
use crate::error::{Error, Result};
use crate::mime::MediaType;
use crate::value::Value;
use csv::{ReaderBuilder, WriterBuilder};

pub const PARAM_SEPARATOR: &str = "separator";
pub const PARAM_QUOTE: &str = "quote";
pub const PARAM_HEADERS: &str = "headers";

fn supported() -> Vec<MediaType> {
    vec![MediaType::csv(), MediaType::new("text", "csv")]
}

struct CsvOptions {
    separator: u8,
    quote: u8,
    headers: bool,
}

impl CsvOptions {
    fn from_media_type(media_type: &MediaType) -> Result<CsvOptions> {
        Ok(CsvOptions {
            separator: single_byte_param(media_type, PARAM_SEPARATOR, b',')?,
            quote: single_byte_param(media_type, PARAM_QUOTE, b'"')?,
            headers: media_type.param(PARAM_HEADERS).map(|h| h != "false").unwrap_or(true),
        })
    }
}

fn single_byte_param(media_type: &MediaType, name: &str, default: u8) -> Result<u8> {
    match media_type.param(name) {
        None => Ok(default),
        Some(value) if value.len() == 1 => Ok(value.as_bytes()[0]),
        Some(value) => Err(Error::Codec(format!(
            "CSV parameter {} must be a single character, got: {}",
            name, value
        ))),
    }
}

pub struct CsvReader;

impl DocumentReader for CsvReader {
    fn supported_types(&self) -> Vec<MediaType> {
        supported()
    }

    fn read(&self, doc: &Document) -> Result<Value> {
        let options = CsvOptions::from_media_type(&doc.media_type)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(options.separator)
            .quote(options.quote)
            .has_headers(options.headers)
            .from_reader(doc.content.as_bytes());

        if options.headers {
            let headers: Vec<String> = reader
                .headers()
                .map_err(|e| Error::Codec(format!("CSV header error: {}", e)))?
                .iter()
                .map(|h| h.to_string())
                .collect();
            let mut rows = Vec::new();
            for record in reader.records() {
                let record =
                    record.map_err(|e| Error::Codec(format!("CSV record error: {}", e)))?;
                let row = Value::object_from_pairs(
                    headers
                        .iter()
                        .zip(record.iter())
                        .map(|(header, field)| (header.clone(), Value::string(field))),
                );
                rows.push(row);
            }
            Ok(Value::array(rows))
        } else {
            let mut rows = Vec::new();
            for record in reader.records() {
                let record =
                    record.map_err(|e| Error::Codec(format!("CSV record error: {}", e)))?;
                let row: Vec<Value> = record.iter().map(Value::string).collect();
                rows.push(Value::array(row));
            }
            Ok(Value::array(rows))
        }
    }
}

pub struct CsvWriter;

impl DocumentWriter for CsvWriter {
    fn supported_types(&self) -> Vec<MediaType> {
        supported()
    }

    fn write(&self, value: &Value, media_type: &MediaType) -> Result<String> {
        let options = CsvOptions::from_media_type(media_type)?;
        let rows = match value {
            Value::Arr(items) => items,
            other => return Err(Error::type_mismatch("array", other.pretty_name())),
        };

        let mut writer = WriterBuilder::new()
            .delimiter(options.separator)
            .quote(options.quote)
            .from_writer(Vec::new());

        let mut headers: Option<Vec<String>> = None;
        for (index, row) in rows.iter().enumerate() {
            match row.force()? {
                Value::Obj(obj) => {
                    if headers.is_none() {
                        let keys: Vec<String> =
                            obj.visible_keys().map(|k| k.to_string()).collect();
                        if options.headers {
                            writer
                                .write_record(&keys)
                                .map_err(|e| Error::Codec(format!("CSV write error: {}", e)))?;
                        }
                        headers = Some(keys);
                    }
                    let keys = headers.as_ref().unwrap();
                    let mut record = Vec::with_capacity(keys.len());
                    for key in keys {
                        let cell = match obj.get_visible(key) {
                            Some(member) => scalar_to_string(&member.value.force()?)?,
                            None => String::new(),
                        };
                        record.push(cell);
                    }
                    writer
                        .write_record(&record)
                        .map_err(|e| Error::Codec(format!("CSV write error: {}", e)))?;
                }
                Value::Arr(cells) => {
                    let mut record = Vec::with_capacity(cells.len());
                    for cell in cells.iter() {
                        record.push(scalar_to_string(&cell.force()?)?);
                    }
                    writer
                        .write_record(&record)
                        .map_err(|e| Error::Codec(format!("CSV write error: {}", e)))?;
                }
                other => {
                    return Err(Error::Codec(format!(
                        "CSV rows must be objects or arrays, row {} is {}",
                        index,
                        other.pretty_name()
                    )))
                }
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Codec(format!("CSV write error: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| Error::Codec(format!("CSV write error: {}", e)))
    }
}
