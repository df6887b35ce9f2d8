//! `wirekit-flate` implements the byte-oriented compression codecs of the wirekit building
//! blocks: DEFLATE (RFC 1951), the gzip container (RFC 1952) and the LZW `.Z` format.
//!
//! Inputs and outputs are complete buffers; there is no streaming decode at this layer.

mod bits;

pub mod deflate;
pub mod error;
pub mod gzip;
pub mod huffman;
pub mod inflate;
pub mod lzw;

//
// public types
//

pub use deflate::deflate;
pub use error::{FlateError, GzipError, LzwError};
pub use inflate::{inflate, Inflater};
