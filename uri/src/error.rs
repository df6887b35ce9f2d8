//! Error types returned by the URI parsers.

use wirekit_common::error::{ReportStack, ReportableError};

/// Error type returned by this crate.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    /// The input does not begin with a `scheme ":"` prefix.
    #[error("Missing scheme")]
    MissingScheme,

    /// The scheme violates `ALPHA *( ALPHA / DIGIT / \"+\" / \"-\" / \".\" )`.
    #[error("Invalid scheme")]
    InvalidScheme,

    /// A bracketed host is not a valid IPv6 address or IPvFuture literal.
    #[error("Invalid host")]
    InvalidHost,

    /// The path does not match any of the grammar's path forms.
    #[error("Invalid path")]
    InvalidPath,

    /// Input remained after the parsed production.
    #[error("Extra input after URI")]
    TrailingInput,
}

impl ReportableError for UriError {
    type Stack = ReportStack;
}
