//! datamorph: a lazy data-transformation engine.
//!
//! Given typed input documents (JSON, CSV, XML, plain text), evaluate a
//! functional script against them and serialize the resulting value into a
//! chosen output format. The script language's parser is an external
//! collaborator; this crate provides the value model, the tree-walking lazy
//! evaluator, the standard library of transformation builtins, the
//! media-type-keyed codec registry, and the script-header parser.

pub mod codec;
pub mod engine;
pub mod error;
pub mod eval;
pub mod header;
pub mod mime;
pub mod stdlib;
pub mod value;

pub use codec::{CodecRegistry, Document, DocumentReader, DocumentWriter};
pub use engine::{Engine, EngineBuilder, Script};
pub use error::{Error, Position, Result};
pub use header::Header;
pub use mime::MediaType;
pub use value::Value;
