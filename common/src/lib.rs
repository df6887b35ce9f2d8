#![warn(missing_docs)]

//! `wirekit-common` is the common library shared by the `wirekit` protocol building blocks.

#[macro_use]
pub mod macros;

pub mod bitio;
pub mod error;

//
// public types
//

pub use bitio::{BitError, BitReader, BitWriter};
pub use error::{Report, Result, ResultExt};
