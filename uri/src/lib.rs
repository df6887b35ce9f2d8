//! `wirekit-uri` implements the RFC 3986 URI model of the wirekit building blocks: the
//! grammar-driven parsers for URIs and URI references, dot-segment removal, and reference
//! resolution in strict and non-strict modes.
//!
//! Inputs and outputs are ASCII strings; serialization restores bracketed literal hosts and
//! re-percent-encodes each component per its character class.

mod chars;
mod fmt;
mod resolve;

pub mod error;
pub mod parse;

//
// public types
//

pub use error::UriError;
pub use parse::{Authority, Param, Path, PathKind, Query, Uri};
