//! Media types: an RFC-7231-style `type/subtype;params` triple with
//! insertion-ordered parameters, quality-value ranking, and the parameter
//! layering used when a header declaration meets a concrete document.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt;

pub const PARAM_QUALITY: &str = "q";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    kind: String,
    subtype: String,
    params: IndexMap<String, String>,
}

impl MediaType {
    pub fn new(kind: impl Into<String>, subtype: impl Into<String>) -> MediaType {
        MediaType {
            kind: kind.into(),
            subtype: subtype.into(),
            params: IndexMap::new(),
        }
    }

    pub fn json() -> MediaType {
        MediaType::new("application", "json")
    }

    pub fn csv() -> MediaType {
        MediaType::new("application", "csv")
    }

    pub fn xml() -> MediaType {
        MediaType::new("application", "xml")
    }

    pub fn plain_text() -> MediaType {
        MediaType::new("text", "plain")
    }

    /// `*/*`, the fallback output when a script declares nothing.
    pub fn any() -> MediaType {
        MediaType::new("*", "*")
    }

    /// Parse `type/subtype` optionally followed by `;k=v` parameters.
    /// Parameter values may be double-quoted.
    pub fn parse(input: &str) -> Result<MediaType> {
        let mut sections = input.split(';');
        let index = sections
            .next()
            .ok_or_else(|| Error::InvalidMediaType(input.to_string()))?
            .trim();
        let (kind, subtype) = index
            .split_once('/')
            .ok_or_else(|| Error::InvalidMediaType(input.to_string()))?;
        if kind.is_empty() || subtype.is_empty() || kind.contains(char::is_whitespace) {
            return Err(Error::InvalidMediaType(input.to_string()));
        }
        let mut media_type = MediaType::new(kind, subtype);
        for section in sections {
            let section = section.trim();
            if section.is_empty() {
                continue;
            }
            let (name, value) = section
                .split_once('=')
                .ok_or_else(|| Error::InvalidMediaType(input.to_string()))?;
            let value = value.trim().trim_matches('"');
            media_type
                .params
                .insert(name.trim().to_string(), value.to_string());
        }
        Ok(media_type)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    pub fn params(&self) -> &IndexMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> MediaType {
        self.params.insert(name.into(), value.into());
        self
    }

    /// The `q` parameter, defaulting to 1.0; unparseable values rank lowest.
    pub fn quality(&self) -> f64 {
        self.param(PARAM_QUALITY)
            .map(|q| q.parse::<f64>().unwrap_or(0.0))
            .unwrap_or(1.0)
    }

    /// Two media types share an index iff their `(type, subtype)` match.
    pub fn same_index(&self, other: &MediaType) -> bool {
        self.kind == other.kind && self.subtype == other.subtype
    }

    /// Overlay `other`'s parameters on top of this type's. Used to layer
    /// dataformat defaults < declaration parameters < document parameters.
    pub fn layered_with(&self, other: &MediaType) -> MediaType {
        let mut merged = self.clone();
        for (name, value) in &other.params {
            merged.params.insert(name.clone(), value.clone());
        }
        merged
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)?;
        for (name, value) in &self.params {
            write!(f, ";{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Highest quality first, ties keeping their original order.
pub fn sort_by_quality(types: &mut [MediaType]) {
    types.sort_by(|a, b| {
        b.quality()
            .partial_cmp(&a.quality())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let mt = MediaType::parse("application/json").unwrap();
        assert_eq!(mt.kind(), "application");
        assert_eq!(mt.subtype(), "json");
        assert!(mt.params().is_empty());
    }

    #[test]
    fn test_parse_with_params_preserves_order() {
        let mt = MediaType::parse("application/csv;separator=|;quote=\"'\"").unwrap();
        assert_eq!(mt.param("separator"), Some("|"));
        assert_eq!(mt.param("quote"), Some("'"));
        let names: Vec<&String> = mt.params().keys().collect();
        assert_eq!(names, vec!["separator", "quote"]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(MediaType::parse("not a media type").is_err());
        assert!(MediaType::parse("missing-subtype/").is_err());
        assert!(MediaType::parse("application/json;bare").is_err());
    }

    #[test]
    fn test_quality_default_and_explicit() {
        let plain = MediaType::parse("application/json").unwrap();
        assert_eq!(plain.quality(), 1.0);
        let ranked = MediaType::parse("application/csv;q=0.5").unwrap();
        assert_eq!(ranked.quality(), 0.5);
    }

    #[test]
    fn test_same_index_ignores_params() {
        let a = MediaType::parse("application/json;charset=utf-8").unwrap();
        let b = MediaType::parse("application/json;q=0.1").unwrap();
        assert!(a.same_index(&b));
        assert!(!a.same_index(&MediaType::plain_text()));
    }

    #[test]
    fn test_layering_overlay_wins() {
        let defaults = MediaType::csv().with_param("separator", ",").with_param("quote", "\"");
        let declared = MediaType::csv().with_param("separator", "|");
        let merged = defaults.layered_with(&declared);
        assert_eq!(merged.param("separator"), Some("|"));
        assert_eq!(merged.param("quote"), Some("\""));
    }

    #[test]
    fn test_sort_by_quality_is_stable() {
        let mut types = vec![
            MediaType::parse("application/json;q=0.2;tag=first").unwrap(),
            MediaType::parse("application/csv;q=0.9").unwrap(),
            MediaType::parse("application/json;q=0.2;tag=second").unwrap(),
        ];
        sort_by_quality(&mut types);
        assert_eq!(types[0].subtype(), "csv");
        assert_eq!(types[1].param("tag"), Some("first"));
        assert_eq!(types[2].param("tag"), Some("second"));
    }

    #[test]
    fn test_display_round_trip() {
        let mt = MediaType::csv().with_param("separator", "|");
        assert_eq!(mt.to_string(), "application/csv;separator=|");
        assert_eq!(MediaType::parse(&mt.to_string()).unwrap(), mt);
    }
}
