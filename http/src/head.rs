//! Request and response heads (RFC 7230 §3): start line plus header fields.
//!
//! There is no streaming at this layer. Callers accumulate socket reads into one buffer and
//! re-invoke the parser; `Ok(None)` means the head's terminating empty line has not arrived
//! yet, `Ok(Some((head, consumed)))` hands back the parsed head and how many bytes it spanned.

use log::debug;
use wirekit_common::{bail_attach, ensure_attach, Result};

use crate::error::HttpError;
use crate::target::RequestTarget;

// Heads larger than this are rejected outright.
const MAX_HEAD_SIZE: usize = 8 * 1024;

//
// public types
//

/// An HTTP version: the two digits of `HTTP/<major>.<minor>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

/// A parsed request head.
#[derive(Clone, Debug)]
pub struct RequestHead {
    pub method: String,
    pub target: RequestTarget,
    pub version: Version,
    pub headers: Headers,
}

/// A parsed response head.
#[derive(Clone, Debug)]
pub struct ResponseHead {
    pub version: Version,
    pub status: u16,
    pub reason: String,
    pub headers: Headers,
}

/// Header fields in arrival order, with values collected per normalized field name.
#[derive(Clone, Debug, Default)]
pub struct Headers {
    fields: Vec<(String, Vec<String>)>,
}

//
// Version impls
//

impl Version {
    pub fn is_http_1_0(&self) -> bool {
        self.major == 1 && self.minor == 0
    }

    pub fn is_http_1_1(&self) -> bool {
        self.major == 1 && self.minor == 1
    }
}

//
// RequestHead impls
//

impl RequestHead {
    /// Parses a request head from the front of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Option<(Self, usize)>, HttpError> {
        let Some(head_len) = head_length(buf)? else {
            return Ok(None);
        };
        let mut lines = Lines::new(&buf[..head_len]);
        let request_line = lines.next_line()?;
        let (method, target, version) = parse_request_line(request_line)?;
        debug!("request: {method} {target:?} {version:?}");
        let headers = parse_header_fields(&mut lines)?;
        Ok(Some((Self { method, target, version, headers }, head_len)))
    }
}

//
// ResponseHead impls
//

impl ResponseHead {
    /// Parses a response head from the front of `buf`.
    pub fn parse(buf: &[u8]) -> Result<Option<(Self, usize)>, HttpError> {
        let Some(head_len) = head_length(buf)? else {
            return Ok(None);
        };
        let mut lines = Lines::new(&buf[..head_len]);
        let status_line = lines.next_line()?;
        let (version, status, reason) = parse_status_line(status_line)?;
        let headers = parse_header_fields(&mut lines)?;
        Ok(Some((Self { version, status, reason, headers }, head_len)))
    }
}

//
// Headers impls
//

impl Headers {
    /// Whether a field with this (unnormalized) name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The values recorded for this field name, in arrival order.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        let name = normalize_field_name(name);
        self.fields
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, values)| values.as_slice())
    }

    /// The first value recorded for this field name.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)?.first().map(String::as_str)
    }

    /// The normalized field names in first-arrival order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    fn push(&mut self, name: String, value: String) {
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value),
            None => self.fields.push((name, vec![value])),
        }
    }
}

//
// character classes (RFC 7230 §3.2.6)
//

pub(crate) fn is_tchar(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_'
                | b'`' | b'|' | b'~'
        )
}

pub(crate) fn is_vchar(byte: u8) -> bool {
    (0x21..=0x7E).contains(&byte)
}

pub(crate) fn is_obs_text(byte: u8) -> bool {
    byte >= 0x80
}

pub(crate) fn is_field_vchar(byte: u8) -> bool {
    is_vchar(byte) || is_obs_text(byte)
}

pub(crate) fn is_ws(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

fn is_reason_phrase(byte: u8) -> bool {
    is_field_vchar(byte) || is_ws(byte)
}

/// Field names render Capitalized-After-Hyphen, so lookups are case-insensitive in effect.
pub(crate) fn normalize_field_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut start_of_run = true;
    for c in name.chars() {
        if c.is_ascii_alphabetic() {
            result.push(if start_of_run { c.to_ascii_uppercase() } else { c.to_ascii_lowercase() });
            start_of_run = false;
        } else {
            result.push(c);
            start_of_run = true;
        }
    }
    result
}

//
// private functions
//

// The head spans through the first empty line; without one the caller must keep reading.
fn head_length(buf: &[u8]) -> Result<Option<usize>, HttpError> {
    match find(buf, b"\r\n\r\n") {
        Some(position) => {
            ensure_attach!(position + 4 <= MAX_HEAD_SIZE, HttpError::HeaderTooLarge);
            Ok(Some(position + 4))
        }
        None => {
            ensure_attach!(buf.len() <= MAX_HEAD_SIZE, HttpError::HeaderTooLarge);
            Ok(None)
        }
    }
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

struct Lines<'a> {
    buf: &'a [u8],
}

impl<'a> Lines<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn next_line(&mut self) -> Result<&'a [u8], HttpError> {
        match find(self.buf, b"\r\n") {
            Some(position) => {
                let line = &self.buf[..position];
                self.buf = &self.buf[position + 2..];
                Ok(line)
            }
            None => bail_attach!(HttpError::InvalidHeaderField),
        }
    }

    fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

fn parse_request_line(line: &[u8]) -> Result<(String, RequestTarget, Version), HttpError> {
    let method_end = line.iter().take_while(|&&byte| is_tchar(byte)).count();
    ensure_attach!(method_end > 0, HttpError::InvalidStartLine);
    ensure_attach!(line.get(method_end) == Some(&b' '), HttpError::InvalidStartLine);
    let method = ascii_str(&line[..method_end])?.to_owned();

    let rest = &line[method_end + 1..];
    let target_end = match rest.iter().position(|&byte| byte == b' ') {
        Some(position) => position,
        None => bail_attach!(HttpError::InvalidStartLine),
    };
    let target = RequestTarget::parse(&method, ascii_str(&rest[..target_end])?)?;

    let version = parse_version(&rest[target_end + 1..])?;
    Ok((method, target, version))
}

fn parse_status_line(line: &[u8]) -> Result<(Version, u16, String), HttpError> {
    const VERSION_LEN: usize = "HTTP/1.1".len();
    ensure_attach!(line.len() >= VERSION_LEN + 5, HttpError::InvalidStartLine);
    let version = parse_version(&line[..VERSION_LEN])?;
    ensure_attach!(line[VERSION_LEN] == b' ', HttpError::InvalidStartLine);

    let digits = &line[VERSION_LEN + 1..VERSION_LEN + 4];
    ensure_attach!(
        digits.iter().all(u8::is_ascii_digit),
        HttpError::InvalidStartLine
    );
    let status = ascii_str(digits)?.parse().unwrap_or_else(|_| unreachable!());
    ensure_attach!(line[VERSION_LEN + 4] == b' ', HttpError::InvalidStartLine);

    let reason = &line[VERSION_LEN + 5..];
    ensure_attach!(
        reason.iter().all(|&byte| is_reason_phrase(byte)),
        HttpError::InvalidStartLine
    );
    Ok((version, status, ascii_str(reason)?.to_owned()))
}

fn parse_version(bytes: &[u8]) -> Result<Version, HttpError> {
    match *bytes {
        [b'H', b'T', b'T', b'P', b'/', major, b'.', minor]
            if major.is_ascii_digit() && minor.is_ascii_digit() =>
        {
            Ok(Version { major: major - b'0', minor: minor - b'0' })
        }
        _ => bail_attach!(HttpError::InvalidVersion),
    }
}

fn parse_header_fields(lines: &mut Lines<'_>) -> Result<Headers, HttpError> {
    let mut headers = Headers::default();
    loop {
        let line = lines.next_line()?;
        if line.is_empty() {
            ensure_attach!(lines.is_empty(), HttpError::InvalidHeaderField);
            return Ok(headers);
        }
        let name_end = line.iter().take_while(|&&byte| is_tchar(byte)).count();
        ensure_attach!(name_end > 0, HttpError::InvalidHeaderField);
        ensure_attach!(line.get(name_end) == Some(&b':'), HttpError::InvalidHeaderField);
        let name = normalize_field_name(ascii_str(&line[..name_end])?);

        let mut value = &line[name_end + 1..];
        while value.first().copied().is_some_and(is_ws) {
            value = &value[1..];
        }
        while value.last().copied().is_some_and(is_ws) {
            value = &value[..value.len() - 1];
        }
        ensure_attach!(
            value.iter().all(|&byte| is_field_vchar(byte) || is_ws(byte)),
            HttpError::InvalidHeaderField
        );
        headers.push(name, ascii_str(value)?.to_owned());
    }
}

// Field values may carry obs-text bytes, but they must still form valid UTF-8 to be held as
// strings here.
fn ascii_str(bytes: &[u8]) -> Result<&str, HttpError> {
    std::str::from_utf8(bytes).map_err(|_| HttpError::InvalidHeaderField.into())
}
