//! `wirekit-http` implements the HTTP/1.1 message surface of the wirekit building blocks:
//! request and status lines, header fields, the `Transfer-Encoding` grammar and chunked body
//! decoding (RFC 7230/7231), with request targets parsed by `wirekit-uri`.
//!
//! There is no socket handling here. Callers accumulate reads into a buffer and re-invoke the
//! parsers; `Ok(None)` signals that the buffer does not yet hold a complete unit.

pub mod error;
pub mod head;
pub mod status;
pub mod target;
pub mod transfer;

//
// public types
//

pub use error::HttpError;
pub use head::{Headers, RequestHead, ResponseHead, Version};
pub use target::RequestTarget;
pub use transfer::{decode_chunked, request_transfer_encoding, Coding, TransferEncoding};
