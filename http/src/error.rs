//! Error types returned by the HTTP parsers.

use wirekit_common::error::{ReportStack, ReportableError};

/// Error type returned by this crate.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HttpError {
    /// The request or status line does not match its grammar.
    #[error("Invalid start line")]
    InvalidStartLine,

    /// The version field is not `HTTP/<digit>.<digit>`.
    #[error("Invalid HTTP version")]
    InvalidVersion,

    /// A header field line does not match `token ":" OWS field-value OWS`.
    #[error("Invalid header field")]
    InvalidHeaderField,

    /// The head grew beyond the accepted maximum without a terminating empty line.
    #[error("Header section too large")]
    HeaderTooLarge,

    /// A chunk of a chunked body violates the chunk grammar.
    #[error("Invalid chunk")]
    InvalidChunk,

    /// A `Transfer-Encoding` header value does not match its grammar, or `chunked` is not the
    /// final coding.
    #[error("Invalid Transfer-Encoding")]
    InvalidTransferEncoding,

    /// A `Transfer-Encoding` names a coding this implementation cannot decode.
    #[error("Unsupported transfer coding `{_0}`")]
    UnsupportedTransferCoding(String),

    /// A message carries both `Transfer-Encoding` and `Content-Length`.
    #[error("Transfer-Encoding conflicts with Content-Length")]
    ContentLengthConflict,
}

impl ReportableError for HttpError {
    type Stack = ReportStack;
}
