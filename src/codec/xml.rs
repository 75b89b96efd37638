//! XML codec: a badgerfish-style element mapping over quick-xml. Attributes
//! become `@`-prefixed keys, element text lands under the `textkey`
//! parameter (default `$`), repeated sibling elements become arrays, and
//! text-only elements collapse to plain strings.

use super::{Document, DocumentReader, DocumentWriter};
use crate::error::{Error, Result};
use crate::mime::MediaType;
use crate::value::{render_num, Value};
use indexmap::IndexMap;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

pub const PARAM_TEXT_KEY: &str = "textkey";
pub const PARAM_ATTR_PREFIX: &str = "attrprefix";

fn supported() -> Vec<MediaType> {
    vec![MediaType::xml(), MediaType::new("text", "xml")]
}

struct XmlOptions {
    text_key: String,
    attr_prefix: String,
}

impl XmlOptions {
    fn from_media_type(media_type: &MediaType) -> XmlOptions {
        XmlOptions {
            text_key: media_type.param(PARAM_TEXT_KEY).unwrap_or("$").to_string(),
            attr_prefix: media_type.param(PARAM_ATTR_PREFIX).unwrap_or("@").to_string(),
        }
    }
}

#[derive(Default)]
struct Element {
    attrs: Vec<(String, String)>,
    children: Vec<(String, Element)>,
    text: String,
}

impl Element {
    fn is_text_only(&self) -> bool {
        self.attrs.is_empty() && self.children.is_empty()
    }

    fn into_value(self, options: &XmlOptions) -> Value {
        if self.is_text_only() {
            return Value::string(self.text);
        }
        let mut grouped: IndexMap<String, Vec<Value>> = IndexMap::new();
        for (name, attr_value) in self.attrs {
            grouped
                .entry(format!("{}{}", options.attr_prefix, name))
                .or_default()
                .push(Value::string(attr_value));
        }
        if !self.text.is_empty() {
            grouped
                .entry(options.text_key.clone())
                .or_default()
                .push(Value::string(&self.text));
        }
        for (name, child) in self.children {
            grouped
                .entry(name)
                .or_default()
                .push(child.into_value(options));
        }
        Value::object_from_pairs(grouped.into_iter().map(|(key, mut values)| {
            let value = if values.len() == 1 {
                values.pop().unwrap()
            } else {
                Value::array(values)
            };
            (key, value)
        }))
    }
}

pub struct XmlReader;

impl DocumentReader for XmlReader {
    fn supported_types(&self) -> Vec<MediaType> {
        supported()
    }

    fn read(&self, doc: &Document) -> Result<Value> {
        let options = XmlOptions::from_media_type(&doc.media_type);
        let mut reader = Reader::from_str(&doc.content);
        reader.trim_text(true);

        let mut stack: Vec<(String, Element)> = Vec::new();
        let mut root: Option<(String, Element)> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::Codec(format!("XML parse error: {}", e)))?;
            match event {
                Event::Start(start) => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
                    let mut element = Element::default();
                    for attr in start.attributes() {
                        let attr =
                            attr.map_err(|e| Error::Codec(format!("XML parse error: {}", e)))?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                        let value = attr
                            .unescape_value()
                            .map_err(|e| Error::Codec(format!("XML parse error: {}", e)))?
                            .to_string();
                        element.attrs.push((key, value));
                    }
                    stack.push((name, element));
                }
                Event::Empty(start) => {
                    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
                    let mut element = Element::default();
                    for attr in start.attributes() {
                        let attr =
                            attr.map_err(|e| Error::Codec(format!("XML parse error: {}", e)))?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                        let value = attr
                            .unescape_value()
                            .map_err(|e| Error::Codec(format!("XML parse error: {}", e)))?
                            .to_string();
                        element.attrs.push((key, value));
                    }
                    attach(&mut stack, &mut root, name, element)?;
                }
                Event::Text(text) => {
                    let content = text
                        .unescape()
                        .map_err(|e| Error::Codec(format!("XML parse error: {}", e)))?;
                    if let Some((_, parent)) = stack.last_mut() {
                        parent.text.push_str(&content);
                    }
                }
                Event::CData(cdata) => {
                    let content = String::from_utf8_lossy(&cdata.into_inner()).to_string();
                    if let Some((_, parent)) = stack.last_mut() {
                        parent.text.push_str(&content);
                    }
                }
                Event::End(_) => {
                    let (name, element) = stack
                        .pop()
                        .ok_or_else(|| Error::Codec("XML parse error: unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, name, element)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let (name, element) = root
            .ok_or_else(|| Error::Codec("XML parse error: no root element".to_string()))?;
        Ok(Value::object_from_pairs(vec![(
            name,
            element.into_value(&options),
        )]))
    }
}

fn attach(
    stack: &mut Vec<(String, Element)>,
    root: &mut Option<(String, Element)>,
    name: String,
    element: Element,
) -> Result<()> {
    match stack.last_mut() {
        Some((_, parent)) => {
            parent.children.push((name, element));
            Ok(())
        }
        None => {
            if root.is_some() {
                return Err(Error::Codec(
                    "XML parse error: multiple root elements".to_string(),
                ));
            }
            *root = Some((name, element));
            Ok(())
        }
    }
}

pub struct XmlWriter;

impl DocumentWriter for XmlWriter {
    fn supported_types(&self) -> Vec<MediaType> {
        supported()
    }

    fn write(&self, value: &Value, media_type: &MediaType) -> Result<String> {
        let options = XmlOptions::from_media_type(media_type);
        let obj = match value {
            Value::Obj(obj) => obj,
            other => return Err(Error::type_mismatch("object", other.pretty_name())),
        };
        let mut entries = obj.visible_entries();
        let (name, member) = entries.next().ok_or_else(|| {
            Error::Codec("XML output requires a single root element".to_string())
        })?;
        if entries.next().is_some() {
            return Err(Error::Codec(
                "XML output requires a single root element".to_string(),
            ));
        }
        let mut out = String::new();
        write_element(&mut out, name, &member.value.force()?, &options)?;
        Ok(out)
    }
}

fn write_element(out: &mut String, name: &str, value: &Value, options: &XmlOptions) -> Result<()> {
    match value {
        Value::Null => {
            out.push_str(&format!("<{}/>", name));
            Ok(())
        }
        Value::Str(s) => {
            if s.is_empty() {
                out.push_str(&format!("<{}/>", name));
            } else {
                out.push_str(&format!("<{}>{}</{}>", name, escape(s), name));
            }
            Ok(())
        }
        Value::Num(n) => {
            out.push_str(&format!("<{}>{}</{}>", name, render_num(*n), name));
            Ok(())
        }
        Value::Bool(b) => {
            out.push_str(&format!("<{}>{}</{}>", name, b, name));
            Ok(())
        }
        Value::Arr(items) => {
            for item in items.iter() {
                write_element(out, name, &item.force()?, options)?;
            }
            Ok(())
        }
        Value::Obj(obj) => {
            let mut attrs = String::new();
            let mut body = String::new();
            for (key, member) in obj.visible_entries() {
                let child = member.value.force()?;
                if let Some(attr_name) = key.strip_prefix(options.attr_prefix.as_str()) {
                    let rendered = super::scalar_to_string(&child)?;
                    attrs.push_str(&format!(" {}=\"{}\"", attr_name, escape(&rendered)));
                } else if key == options.text_key {
                    let rendered = super::scalar_to_string(&child)?;
                    body.push_str(&escape(&rendered));
                } else {
                    write_element(&mut body, key, &child, options)?;
                }
            }
            if body.is_empty() {
                out.push_str(&format!("<{}{}/>", name, attrs));
            } else {
                out.push_str(&format!("<{}{}>{}</{}>", name, attrs, body, name));
            }
            Ok(())
        }
        Value::Func(_) => Err(Error::type_mismatch("a serializable value", "function")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_text_only_elements_collapse_to_strings() {
        let doc = Document::new("<root><a>1</a><b>two</b></root>", MediaType::xml());
        let value = XmlReader.read(&doc).unwrap();
        let expected = Value::object_from_pairs(vec![(
            "root".to_string(),
            Value::object_from_pairs(vec![
                ("a".to_string(), Value::string("1")),
                ("b".to_string(), Value::string("two")),
            ]),
        )]);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_read_attributes_and_text() {
        let doc = Document::new(
            r#"<note lang="en">hello</note>"#,
            MediaType::xml(),
        );
        let value = XmlReader.read(&doc).unwrap();
        let expected = Value::object_from_pairs(vec![(
            "note".to_string(),
            Value::object_from_pairs(vec![
                ("@lang".to_string(), Value::string("en")),
                ("$".to_string(), Value::string("hello")),
            ]),
        )]);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_read_repeated_elements_become_arrays() {
        let doc = Document::new(
            "<list><item>1</item><item>2</item></list>",
            MediaType::xml(),
        );
        let value = XmlReader.read(&doc).unwrap();
        let expected = Value::object_from_pairs(vec![(
            "list".to_string(),
            Value::object_from_pairs(vec![(
                "item".to_string(),
                Value::array(vec![Value::string("1"), Value::string("2")]),
            )]),
        )]);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_write_round_trip() {
        let doc = Document::new(
            r#"<order id="7"><sku>ABC</sku><sku>DEF</sku></order>"#,
            MediaType::xml(),
        );
        let value = XmlReader.read(&doc).unwrap();
        let written = XmlWriter.write(&value, &MediaType::xml()).unwrap();
        assert_eq!(written, r#"<order id="7"><sku>ABC</sku><sku>DEF</sku></order>"#);
    }

    #[test]
    fn test_write_escapes_markup() {
        let value = Value::object_from_pairs(vec![(
            "msg".to_string(),
            Value::string("a < b & c"),
        )]);
        let written = XmlWriter.write(&value, &MediaType::xml()).unwrap();
        assert_eq!(written, "<msg>a &lt; b &amp; c</msg>");
    }

    #[test]
    fn test_custom_text_key() {
        let media_type = MediaType::xml().with_param(PARAM_TEXT_KEY, "_text");
        let doc = Document::new(r#"<a b="1">t</a>"#, media_type.clone());
        let value = XmlReader.read(&doc).unwrap();
        let expected = Value::object_from_pairs(vec![(
            "a".to_string(),
            Value::object_from_pairs(vec![
                ("@b".to_string(), Value::string("1")),
                ("_text".to_string(), Value::string("t")),
            ]),
        )]);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_write_requires_single_root() {
        let value = Value::object_from_pairs(vec![
            ("a".to_string(), Value::string("1")),
            ("b".to_string(), Value::string("2")),
        ]);
        let err = XmlWriter.write(&value, &MediaType::xml()).unwrap_err();
        assert!(err.to_string().contains("single root element"));
    }
}
