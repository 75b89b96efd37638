//! The `jsonpath` namespace: `select` delegates to the external JsonPath
//! library over the serde_json bridge and always returns the match list.

use super::common::*;
use crate::codec::{value_from_json, value_to_json};
use crate::error::{Error, Result};
use crate::value::Value;

/// Usage: select(payload, "$.books[?(@.price < 10)].title") -> matches
pub fn select(args: &[Value]) -> Result<Value> {
    expect_arg_count(args, 2)?;
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    let path = as_str(&args[1])?;
    let json = value_to_json(&args[0])?;
    let matches = jsonpath_lib::select(&json, path)
        .map_err(|e| Error::Domain(format!("Invalid JsonPath expression {}: {}", path, e)))?;
    Ok(Value::array(
        matches
            .into_iter()
            .map(|found| value_from_json(found, true))
            .collect(),
    ))
}
