//! Parser for the script prologue: a leading `/** DataSonnet ... */` block
//! declaring input/output media types, codec defaults, and key-order
//! preservation.

use crate::error::{Error, Result};
use crate::mime::{sort_by_quality, MediaType};
use indexmap::IndexMap;
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

const HEADER_MARKER: &str = "/** DataSonnet";
const HEADER_TERMINATOR: &str = "*/";
const COMMENT_PREFIX: &str = "//";

static INPUT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:input (?P<name>\w+)|input (?P<all>\*)) (?P<mediatype>\S.*)$").unwrap()
});
static OUTPUT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^output (?P<mediatype>\S.*)$").unwrap());

#[derive(Debug, Clone)]
pub struct Header {
    preserve_order: bool,
    named_inputs: IndexMap<String, Vec<MediaType>>,
    all_inputs: Vec<MediaType>,
    outputs: Vec<MediaType>,
    dataformats: Vec<MediaType>,
}

impl Default for Header {
    fn default() -> Header {
        Header {
            preserve_order: true,
            named_inputs: IndexMap::new(),
            all_inputs: Vec::new(),
            outputs: Vec::new(),
            dataformats: Vec::new(),
        }
    }
}

impl Header {
    /// Parse the header block from a script. A script without the marker has
    /// the empty header; a marker without `*/` is a fatal parse error.
    pub fn parse(script: &str) -> Result<Header> {
        if !script.trim_start().starts_with(HEADER_MARKER) {
            return Ok(Header::default());
        }
        let terminus = script.find(HEADER_TERMINATOR).ok_or_else(|| {
            Error::HeaderParse("Unterminated header. Headers must end with */".to_string())
        })?;
        let section = script[..terminus].replacen(HEADER_MARKER, "", 1);

        let mut header = Header::default();
        for raw_line in section.lines() {
            let line = raw_line.trim();
            header.parse_line(line)?;
        }
        Ok(header)
    }

    fn parse_line(&mut self, line: &str) -> Result<()> {
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            return Ok(());
        }
        if let Some(rest) = line.strip_prefix("preserveOrder") {
            let value = rest.trim_start().strip_prefix('=').ok_or_else(|| {
                Error::HeaderParse(format!("Problem with header formatting in line {}", line))
            })?;
            self.preserve_order = value.trim() == "true";
        } else if line.starts_with("input") {
            let captures = INPUT_LINE.captures(line).ok_or_else(|| {
                Error::HeaderParse(format!(
                    "Unable to parse header line {}, it must follow the input line format",
                    line
                ))
            })?;
            let media_type = parse_media_type(&captures["mediatype"], line)?;
            if captures.name("all").is_some() {
                self.all_inputs.push(media_type);
            } else {
                let name = captures["name"].to_string();
                self.named_inputs.entry(name).or_default().push(media_type);
            }
        } else if line.starts_with("output") {
            let captures = OUTPUT_LINE.captures(line).ok_or_else(|| {
                Error::HeaderParse(format!(
                    "Unable to parse header line {}, it must follow the output line format",
                    line
                ))
            })?;
            self.outputs.push(parse_media_type(&captures["mediatype"], line)?);
        } else if let Some(rest) = line.strip_prefix("dataformat") {
            let declared = rest.trim();
            if declared.is_empty() {
                return Err(Error::HeaderParse(format!(
                    "Problem with header formatting in line {}",
                    line
                )));
            }
            self.dataformats.push(parse_media_type(declared, line)?);
        } else {
            return Err(Error::HeaderParse(format!(
                "Unable to parse header line: {}",
                line
            )));
        }
        trace!("accepted header line: {}", line);
        Ok(())
    }

    pub fn preserve_order(&self) -> bool {
        self.preserve_order
    }

    /// The default media type for a named input: its highest-quality
    /// declaration, if any was made.
    pub fn default_input_for(&self, name: &str) -> Option<MediaType> {
        let declared = self.named_inputs.get(name)?;
        let mut sorted = declared.clone();
        sort_by_quality(&mut sorted);
        sorted.into_iter().next()
    }

    /// The highest-quality `output` declaration, or `*/*` when none exist.
    pub fn default_output(&self) -> MediaType {
        if self.outputs.is_empty() {
            return MediaType::any();
        }
        let mut sorted = self.outputs.clone();
        sort_by_quality(&mut sorted);
        sorted.into_iter().next().unwrap()
    }

    pub fn outputs(&self) -> &[MediaType] {
        &self.outputs
    }

    /// Layer parameters onto a named input document's media type:
    /// dataformat defaults, then `input *` declarations, then the named
    /// declaration, then the document's own parameters (strongest).
    pub fn combine_input_params(&self, name: &str, document_type: &MediaType) -> MediaType {
        let mut merged = MediaType::new(document_type.kind(), document_type.subtype());
        if let Some(defaults) = find_index(&self.dataformats, document_type) {
            merged = merged.layered_with(defaults);
        }
        if let Some(all) = find_index(&self.all_inputs, document_type) {
            merged = merged.layered_with(all);
        }
        if let Some(declared) = self
            .named_inputs
            .get(name)
            .and_then(|types| find_index(types, document_type))
        {
            merged = merged.layered_with(declared);
        }
        merged.layered_with(document_type)
    }

    /// Same layering for the output side: dataformat defaults, then the
    /// matching `output` declaration, then the requested type's parameters.
    pub fn combine_output_params(&self, requested: &MediaType) -> MediaType {
        let mut merged = MediaType::new(requested.kind(), requested.subtype());
        if let Some(defaults) = find_index(&self.dataformats, requested) {
            merged = merged.layered_with(defaults);
        }
        if let Some(declared) = find_index(&self.outputs, requested) {
            merged = merged.layered_with(declared);
        }
        merged.layered_with(requested)
    }
}

fn find_index<'a>(types: &'a [MediaType], target: &MediaType) -> Option<&'a MediaType> {
    types.iter().find(|candidate| candidate.same_index(target))
}

fn parse_media_type(declared: &str, line: &str) -> Result<MediaType> {
    MediaType::parse(declared).map_err(|_| {
        Error::HeaderParse(format!(
            "Could not parse media type from header in line {}",
            line
        ))
    })
}
