//! The four request-target forms of RFC 7230 §5.3, over the URI parsers.

use wirekit_common::{bail_attach, Result};
use wirekit_uri::Uri;

use crate::error::HttpError;

/// A request target: `*`, origin-form, absolute-URI, or authority form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestTarget {
    /// `*`, for server-wide `OPTIONS`.
    Asterisk,

    /// An absolute path plus optional query, the common case.
    Origin(Uri),

    /// A full URI, as sent to proxies.
    Absolute(Uri),

    /// A bare `host:port`, for `CONNECT`.
    Authority(Uri),
}

impl RequestTarget {
    /// Parses a request target.
    ///
    /// The method selects the form: `CONNECT` takes the authority form exclusively — a bare
    /// `host:port` would otherwise parse as an absolute URI with the host as its scheme —
    /// while every other method takes `*`, origin-form or absolute-URI.
    pub fn parse(method: &str, text: &str) -> Result<Self, HttpError> {
        if method == "CONNECT" {
            match Uri::parse_authority_form(text) {
                Ok(uri) => return Ok(Self::Authority(uri)),
                Err(_) => bail_attach!(HttpError::InvalidStartLine, format!("request target `{text}`")),
            }
        }
        if text == "*" {
            return Ok(Self::Asterisk);
        }
        if let Ok(uri) = Uri::parse_origin_form(text) {
            return Ok(Self::Origin(uri));
        }
        if let Ok(uri) = Uri::parse_absolute(text) {
            return Ok(Self::Absolute(uri));
        }
        bail_attach!(HttpError::InvalidStartLine, format!("request target `{text}`"));
    }

    /// The target's URI, when it has one.
    pub fn uri(&self) -> Option<&Uri> {
        match self {
            Self::Asterisk => None,
            Self::Origin(uri) | Self::Absolute(uri) | Self::Authority(uri) => Some(uri),
        }
    }
}
