//! Error types returned by the JSON parser, value tree and patch evaluators.

use wirekit_common::error::{ReportStack, ReportableError};

/// Error type returned by this crate.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum JsonError {
    /// A character outside the JSON grammar was encountered.
    #[error("Unexpected character `{_0}`")]
    UnexpectedCharacter(char),

    /// The input ended in the middle of a value.
    #[error("Unexpected end of input")]
    UnexpectedEnd,

    /// A string contains a backslash escape the grammar does not define.
    #[error("Invalid escape sequence")]
    InvalidEscape,

    /// A `\uXXXX` escape names half of a surrogate pair without a valid other half.
    #[error("Invalid surrogate pair")]
    InvalidSurrogatePair,

    /// A raw control byte below 0x20 appeared inside a string.
    #[error("Control character in string")]
    ControlCharacter,

    /// The string source yielded bytes that are not valid UTF-8.
    #[error("Invalid UTF-8 in string")]
    InvalidUtf8,

    /// A number does not match the RFC 8259 number grammar.
    #[error("Invalid number `{_0}`")]
    InvalidNumber(String),

    /// Input remained after the document's single value.
    #[error("Extra input after document")]
    TrailingInput,

    /// An object carries the same member name twice.
    #[error("Duplicate object key `{_0}`")]
    DuplicateKey(String),

    /// A handler callback returned `false`.
    #[error("Parse aborted by handler")]
    Aborted,

    /// A JSON pointer is not a valid RFC 6901 string, or an array token is malformed.
    #[error("Invalid JSON pointer `{_0}`")]
    InvalidPointer(String),

    /// A pointer names a location that does not exist in the target.
    #[error("Path not found")]
    PathNotFound,

    /// An array index lies outside the range an operation permits.
    #[error("Array index out of range")]
    IndexOutOfRange,

    /// A patch document is not an array of well-formed operation objects.
    #[error("Invalid patch document")]
    InvalidPatch,

    /// A patch `test` operation found an unequal value.
    #[error("Test operation failed")]
    TestFailed,

    /// A patch `move` names a `from` location that is a proper prefix of `path`.
    #[error("Cannot move a value into one of its own children")]
    RecursiveMove,
}

impl ReportableError for JsonError {
    type Stack = ReportStack;
}
