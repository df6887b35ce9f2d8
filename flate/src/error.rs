//! Error types returned by the codecs in this crate.

use derive_more::Display;
use wirekit_common::error::{ReportStack, ReportableError};

/// Error type returned by the DEFLATE decoder and the Huffman alphabet builder.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlateError {
    /// A code length above 15 was supplied to the alphabet builder.
    #[error("Code length exceeds 15 bits")]
    CodeLengthTooLong,

    /// The code length counts violate the Kraft inequality.
    #[error("Oversubscribed code lengths")]
    OversubscribedCode,

    /// The bits read from the stream do not resolve to any symbol of the alphabet.
    #[error("Code not present in alphabet")]
    InvalidCode,

    /// A decoded symbol is outside the range the block type permits.
    #[error("Invalid symbol `{_0}`")]
    InvalidSymbol(u16),

    /// A block carried the reserved block type 3.
    #[error("Reserved block type")]
    ReservedBlockType,

    /// A stored block's `LEN` field does not match the complement of `NLEN`.
    #[error("Stored block length check failed")]
    StoredLengthMismatch,

    /// The counts or code lengths of a dynamic block header are out of range.
    #[error("Invalid dynamic block header")]
    InvalidHeader,

    /// A back-reference points before the start of the output.
    #[error("Back-reference distance `{_0}` exceeds output size `{_1}`")]
    DistanceTooFar(u32, usize),

    /// The bit stream ended in the middle of a block.
    #[error("Truncated stream")]
    TruncatedStream,
}

/// Error type returned by the gzip container codec.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GzipError {
    /// The input does not start with the gzip magic bytes.
    #[error("Bad magic number")]
    BadMagic,

    /// The `CM` header field names a compression method other than DEFLATE.
    #[error("Unsupported compression method `{_0}`")]
    UnsupportedMethod(u8),

    /// Reserved `FLG` bits are set.
    #[error("Reserved header flags set")]
    ReservedFlags,

    /// The header `CRC16` does not match the header bytes.
    #[error("Header checksum mismatch")]
    HeaderChecksumMismatch,

    /// The trailer `CRC32` does not match the decoded output.
    #[error("Data checksum mismatch")]
    DataChecksumMismatch,

    /// The trailer `ISIZE` does not match the decoded output length.
    #[error("Decoded size mismatch")]
    SizeMismatch,

    /// The compressed body is not a valid DEFLATE stream.
    #[error("Invalid deflate stream")]
    Deflate(#[source] FlateError),

    /// The input ended before the header or trailer was complete.
    #[error("Truncated stream")]
    TruncatedStream,
}

/// Error type returned by the LZW `.Z` decoder.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LzwError {
    /// The input does not start with the `.Z` magic bytes.
    #[error("Bad magic number")]
    BadMagic,

    /// The flags byte names a maximum code width outside 9..=16.
    #[error("Unsupported code width `{_0}`")]
    UnsupportedWidth(u8),

    /// A code refers to a dictionary entry that cannot exist yet.
    #[error("Corrupt code stream")]
    CorruptStream,

    /// The input ended before the header was complete.
    #[error("Truncated stream")]
    TruncatedStream,
}

/// A [`Display`]-able indicating an error occurred while decoding a given block.
#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "while decoding block `{}`", _0)]
pub(crate) struct WhileDecodingBlock(pub(crate) usize);

impl ReportableError for FlateError {
    type Stack = ReportStack;
}

impl ReportableError for GzipError {
    type Stack = ReportStack;
}

impl ReportableError for LzwError {
    type Stack = ReportStack;
}
