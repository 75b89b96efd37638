//! The `xml` namespace: codec-backed helpers for scripts that handle XML
//! content inline rather than at the format boundary.

use super::common::*;
use crate::codec::xml::{XmlReader, XmlWriter};
use crate::codec::{Document, DocumentReader, DocumentWriter};
use crate::error::Result;
use crate::mime::MediaType;
use crate::value::Value;

fn media_type(args: &[Value]) -> Result<MediaType> {
    let mut media_type = MediaType::xml();
    if args.len() == 2 {
        let params = as_obj(&args[1])?;
        for (key, member) in params.visible_entries() {
            let value = as_str(&member.value.force()?)?.to_string();
            media_type = media_type.with_param(key, value);
        }
    }
    Ok(media_type)
}

/// Parse an XML string into the badgerfish-style object mapping.
/// Usage: parse("<a>1</a>") -> {a: "1"}
pub fn parse(args: &[Value]) -> Result<Value> {
    expect_arg_range(args, 1, 2)?;
    let content = as_str(&args[0])?;
    let doc = Document::new(content, media_type(args)?);
    XmlReader.read(&doc)
}

/// Serialize the object mapping back to an XML string.
/// Usage: toString({a: "1"}) -> "<a>1</a>"
pub fn to_string(args: &[Value]) -> Result<Value> {
    expect_arg_range(args, 1, 2)?;
    let media_type = media_type(args)?;
    Ok(Value::string(XmlWriter.write(&args[0], &media_type)?))
}

/// Concatenate all text content beneath an element, depth first.
/// Usage: flattenContents(parse("<p>a<b>b</b>c</p>").p) -> "abc"
pub fn flatten_contents(args: &[Value]) -> Result<Value> {
    expect_arg_range(args, 1, 2)?;
    let text_key = match args.get(1) {
        Some(params) => as_obj(params)?
            .get_visible("textkey")
            .map(|member| member.value.force())
            .transpose()?
            .map(|value| as_str(&value).map(str::to_string))
            .transpose()?
            .unwrap_or_else(|| "$".to_string()),
        None => "$".to_string(),
    };
    let mut out = String::new();
    collect_text(&args[0], &text_key, &mut out)?;
    Ok(Value::string(out))
}

fn collect_text(value: &Value, text_key: &str, out: &mut String) -> Result<()> {
    match value {
        Value::Str(s) => out.push_str(s),
        Value::Arr(items) => {
            for item in items.iter() {
                collect_text(&item.force()?, text_key, out)?;
            }
        }
        Value::Obj(obj) => {
            for (key, member) in obj.visible_entries() {
                if key == text_key || !key.starts_with('@') {
                    collect_text(&member.value.force()?, text_key, out)?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::string(text)
    }

    #[test]
    fn test_parse_and_to_string_round_trip() {
        let value = parse(&[s("<order><sku>ABC</sku></order>")]).unwrap();
        assert_eq!(
            value,
            Value::object_from_pairs(vec![(
                "order".to_string(),
                Value::object_from_pairs(vec![("sku".to_string(), s("ABC"))]),
            )])
        );
        assert_eq!(
            to_string(&[value]).unwrap(),
            s("<order><sku>ABC</sku></order>")
        );
    }

    #[test]
    fn test_parse_with_params() {
        let params = Value::object_from_pairs(vec![("textkey".to_string(), s("_text"))]);
        let value = parse(&[s("<a b=\"1\">t</a>"), params]).unwrap();
        assert_eq!(
            value,
            Value::object_from_pairs(vec![(
                "a".to_string(),
                Value::object_from_pairs(vec![
                    ("@b".to_string(), s("1")),
                    ("_text".to_string(), s("t")),
                ]),
            )])
        );
    }

    #[test]
    fn test_flatten_contents_skips_attributes() {
        let value = parse(&[s("<p id=\"x\">a<b>b</b></p>")]).unwrap();
        let element = match &value {
            Value::Obj(obj) => obj.get("p").unwrap().value.force().unwrap(),
            other => panic!("expected object, got {:?}", other),
        };
        assert_eq!(flatten_contents(&[element]).unwrap(), s("ab"));
    }
}
