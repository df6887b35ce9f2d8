//! `wirekit-json` implements the structural JSON engine of the wirekit building blocks: an
//! event-driven parser over a pluggable character source (RFC 8259), a value tree with
//! insertion-ordered object membership, a serializer driving the same handler interface, and
//! evaluators for JSON Pointer (RFC 6901), JSON Patch (RFC 6902) and JSON Merge Patch
//! (RFC 7396).
//!
//! Input is a byte sequence interpreted as UTF-8; output is compact UTF-8 text.

pub mod builder;
pub mod error;
pub mod merge;
pub mod number;
pub mod parse;
pub mod patch;
pub mod pointer;
pub mod serialize;
pub mod value;

//
// public types
//

pub use builder::TreeBuilder;
pub use error::JsonError;
pub use merge::merge_patch;
pub use number::{Canonical, Number};
pub use parse::{Handler, Parser, Source, StrSource};
pub use pointer::{Location, Pointer};
pub use serialize::Writer;
pub use value::{Object, Value};
