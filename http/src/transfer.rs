//! Transfer codings (RFC 7230 §4): the `Transfer-Encoding` header and chunked bodies.

use wirekit_common::{bail_attach, ensure_attach, Result};

use crate::error::HttpError;
use crate::head::{find, is_tchar, is_vchar, is_ws, Headers};

//
// public types
//

/// One transfer coding named by a `Transfer-Encoding` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Coding {
    Chunked,
    Compress,
    Deflate,
    Gzip,

    /// A transfer extension, with its lowercased name.
    Extension(String),
}

/// A coding with its `;name=value` transfer parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferCoding {
    pub coding: Coding,
    pub parameters: Vec<(String, String)>,
}

/// The accumulated coding list of a message's `Transfer-Encoding` headers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferEncoding {
    pub codings: Vec<TransferCoding>,
}

//
// TransferEncoding impls
//

impl TransferEncoding {
    /// Parses one header value: a comma-separated, optionally parameterized coding list.
    pub fn parse(value: &str) -> Result<Self, HttpError> {
        let mut encoding = Self::default();
        encoding.extend_from(value)?;
        Ok(encoding)
    }

    /// Parses every value of a message's `Transfer-Encoding` headers, in order.
    pub fn parse_all<'a, I: IntoIterator<Item = &'a str>>(values: I) -> Result<Self, HttpError> {
        let mut encoding = Self::default();
        for value in values {
            encoding.extend_from(value)?;
        }
        Ok(encoding)
    }

    pub fn has_coding(&self, coding: &Coding) -> bool {
        self.codings.iter().any(|tc| tc.coding == *coding)
    }

    pub fn is_chunked(&self) -> bool {
        self.has_coding(&Coding::Chunked)
    }

    /// Whether every coding is one this implementation can decode.
    pub fn is_supported(&self) -> bool {
        !self.codings.iter().any(|tc| matches!(tc.coding, Coding::Extension(_)))
    }

    /// Whether `chunked` appears exactly once, as the final coding.
    pub fn chunked_is_only_last(&self) -> bool {
        match self.codings.split_last() {
            Some((last, rest)) => {
                last.coding == Coding::Chunked
                    && !rest.iter().any(|tc| tc.coding == Coding::Chunked)
            }
            None => false,
        }
    }

    fn extend_from(&mut self, value: &str) -> Result<(), HttpError> {
        let mut cursor = Cursor { bytes: value.as_bytes(), pos: 0 };
        loop {
            cursor.skip_ws();
            let name = cursor.token().to_ascii_lowercase();
            ensure_attach!(!name.is_empty(), HttpError::InvalidTransferEncoding);
            let coding = match name.as_str() {
                "chunked" => Coding::Chunked,
                "compress" | "x-compress" => Coding::Compress,
                "deflate" => Coding::Deflate,
                "gzip" | "x-gzip" => Coding::Gzip,
                _ => Coding::Extension(name),
            };
            let mut parameters = Vec::new();
            cursor.skip_ws();
            while cursor.eat(b';') {
                cursor.skip_ws();
                let parameter = cursor.token().to_ascii_lowercase();
                ensure_attach!(!parameter.is_empty(), HttpError::InvalidTransferEncoding);
                cursor.skip_ws();
                ensure_attach!(cursor.eat(b'='), HttpError::InvalidTransferEncoding);
                cursor.skip_ws();
                let value = cursor.token_or_quoted()?;
                parameters.push((parameter, value));
                cursor.skip_ws();
            }
            self.codings.push(TransferCoding { coding, parameters });
            cursor.skip_ws();
            if !cursor.eat(b',') {
                break;
            }
        }
        ensure_attach!(cursor.is_empty(), HttpError::InvalidTransferEncoding);
        Ok(())
    }
}

/// Validates a request's framing headers, returning the transfer encoding when present.
///
/// `chunked` must be the sole and final chunking coding, every coding must be supported, and
/// `Content-Length` must not accompany `Transfer-Encoding`.
pub fn request_transfer_encoding(headers: &Headers) -> Result<Option<TransferEncoding>, HttpError> {
    let Some(values) = headers.get("Transfer-Encoding") else {
        return Ok(None);
    };
    let encoding = TransferEncoding::parse_all(values.iter().map(String::as_str))?;
    ensure_attach!(encoding.chunked_is_only_last(), HttpError::InvalidTransferEncoding);
    if let Some(unsupported) =
        encoding.codings.iter().find_map(|tc| match &tc.coding {
            Coding::Extension(name) => Some(name.clone()),
            _ => None,
        })
    {
        bail_attach!(HttpError::UnsupportedTransferCoding(unsupported));
    }
    ensure_attach!(!headers.contains("Content-Length"), HttpError::ContentLengthConflict);
    Ok(Some(encoding))
}

/// Decodes a chunked body from the front of `buf`.
///
/// Returns `Ok(None)` until the last chunk and the terminating empty trailer have arrived, then
/// `Ok(Some((body, consumed)))`. Chunk extensions are parsed and discarded; trailer fields are
/// not supported.
pub fn decode_chunked(buf: &[u8]) -> Result<Option<(Vec<u8>, usize)>, HttpError> {
    let mut body = Vec::new();
    let mut offset = 0;
    loop {
        let rest = &buf[offset..];
        let Some(line_end) = find(rest, b"\r\n") else {
            return Ok(None);
        };
        let (size, last) = parse_chunk_header(&rest[..line_end])?;
        let data_start = offset + line_end + 2;
        if last {
            // last-chunk CRLF, then the (empty) trailer's own CRLF.
            match buf[data_start..] {
                [b'\r', b'\n', ..] => return Ok(Some((body, data_start + 2))),
                [] | [b'\r'] => return Ok(None),
                _ => bail_attach!(HttpError::InvalidChunk, "trailer fields are not supported"),
            }
        }
        if buf.len() < data_start + size + 2 {
            return Ok(None);
        }
        body.extend_from_slice(&buf[data_start..data_start + size]);
        ensure_attach!(
            buf[data_start + size..data_start + size + 2] == *b"\r\n",
            HttpError::InvalidChunk
        );
        offset = data_start + size + 2;
    }
}

//
// private functions
//

// chunk-size [ chunk-ext ]: 1*HEXDIG *( BWS ";" BWS name [ BWS "=" BWS value ] ).
fn parse_chunk_header(line: &[u8]) -> Result<(usize, bool), HttpError> {
    let mut cursor = Cursor { bytes: line, pos: 0 };
    let digits = cursor.take_while(|byte| byte.is_ascii_hexdigit());
    ensure_attach!(!digits.is_empty(), HttpError::InvalidChunk);
    let mut size = 0usize;
    for &digit in digits {
        let value = (digit as char).to_digit(16).unwrap_or_else(|| unreachable!()) as usize;
        size = size
            .checked_mul(16)
            .and_then(|size| size.checked_add(value))
            .ok_or_else(|| HttpError::InvalidChunk)?;
    }
    let last = digits.iter().all(|&digit| digit == b'0');

    cursor.skip_ws();
    while cursor.eat(b';') {
        cursor.skip_ws();
        ensure_attach!(!cursor.token().is_empty(), HttpError::InvalidChunk);
        cursor.skip_ws();
        if cursor.eat(b'=') {
            cursor.skip_ws();
            cursor.token_or_quoted().map_err(|_| HttpError::InvalidChunk)?;
            cursor.skip_ws();
        }
    }
    ensure_attach!(cursor.is_empty(), HttpError::InvalidChunk);
    Ok((size, last))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(is_ws) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(pred) {
            self.pos += 1;
        }
        &self.bytes[start..self.pos]
    }

    fn token(&mut self) -> String {
        String::from_utf8_lossy(self.take_while(is_tchar)).into_owned()
    }

    fn token_or_quoted(&mut self) -> Result<String, HttpError> {
        if !self.eat(b'"') {
            let token = self.token();
            ensure_attach!(!token.is_empty(), HttpError::InvalidTransferEncoding);
            return Ok(token);
        }
        let mut value = Vec::new();
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    let value = String::from_utf8(value)
                        .map_err(|_| HttpError::InvalidTransferEncoding)?;
                    return Ok(value);
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(byte) if is_ws(byte) || is_vchar(byte) || byte >= 0x80 => {
                            value.push(byte);
                            self.pos += 1;
                        }
                        _ => bail_attach!(HttpError::InvalidTransferEncoding),
                    }
                }
                Some(byte) if is_ws(byte) || is_vchar(byte) || byte >= 0x80 => {
                    value.push(byte);
                    self.pos += 1;
                }
                _ => bail_attach!(HttpError::InvalidTransferEncoding),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use crate::head::RequestHead;

    use super::*;

    #[test]
    fn single_codings_parse() {
        let encoding = TransferEncoding::parse("chunked").unwrap();
        assert!(encoding.is_chunked());
        assert!(encoding.chunked_is_only_last());
        assert!(encoding.is_supported());
    }

    #[test]
    fn coding_lists_parse_in_order() {
        let encoding = TransferEncoding::parse("gzip, chunked").unwrap();
        assert_eq!(encoding.codings.len(), 2);
        assert_eq!(encoding.codings[0].coding, Coding::Gzip);
        assert_eq!(encoding.codings[1].coding, Coding::Chunked);
        assert!(encoding.chunked_is_only_last());
    }

    #[test]
    fn legacy_names_recognized() {
        let encoding = TransferEncoding::parse("x-gzip, x-compress, chunked").unwrap();
        assert_eq!(encoding.codings[0].coding, Coding::Gzip);
        assert_eq!(encoding.codings[1].coding, Coding::Compress);
    }

    #[test]
    fn extension_with_parameters() {
        let encoding = TransferEncoding::parse("frob;level=9;mode=\"fast mode\"").unwrap();
        assert_eq!(encoding.codings[0].coding, Coding::Extension("frob".to_owned()));
        assert_eq!(
            encoding.codings[0].parameters,
            [("level".to_owned(), "9".to_owned()), ("mode".to_owned(), "fast mode".to_owned())]
        );
        assert!(!encoding.is_supported());
    }

    #[test]
    fn chunked_must_be_last() {
        let encoding = TransferEncoding::parse("chunked, gzip").unwrap();
        assert!(!encoding.chunked_is_only_last());
        let encoding = TransferEncoding::parse("chunked, chunked").unwrap();
        assert!(!encoding.chunked_is_only_last());
    }

    #[test]
    fn framing_header_validation() {
        let buf = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n";
        let (head, _) = RequestHead::parse(buf).unwrap().unwrap();
        let encoding = request_transfer_encoding(&head.headers).unwrap().unwrap();
        assert!(encoding.is_chunked());

        let buf = b"POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\nContent-Length: 3\r\n\r\n";
        let (head, _) = RequestHead::parse(buf).unwrap().unwrap();
        assert_matches!(
            request_transfer_encoding(&head.headers),
            Err(err) if *err.get_ref() == HttpError::ContentLengthConflict
        );

        let buf = b"POST / HTTP/1.1\r\nTransfer-Encoding: frob, chunked\r\n\r\n";
        let (head, _) = RequestHead::parse(buf).unwrap().unwrap();
        assert_matches!(
            request_transfer_encoding(&head.headers),
            Err(err) if *err.get_ref() == HttpError::UnsupportedTransferCoding("frob".to_owned())
        );
    }

    #[test]
    fn chunked_body_decodes() {
        let buf = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\nleftover";
        let (body, consumed) = decode_chunked(buf).unwrap().unwrap();
        assert_eq!(body, b"Wikipedia");
        assert_eq!(consumed, buf.len() - "leftover".len());
    }

    #[test]
    fn chunk_extensions_ignored() {
        let buf = b"4;ext=1;name=\"v\"\r\ndata\r\n0\r\n\r\n";
        let (body, _) = decode_chunked(buf).unwrap().unwrap();
        assert_eq!(body, b"data");
    }

    #[test]
    fn partial_chunked_body_needs_more() {
        assert_matches!(decode_chunked(b""), Ok(None));
        assert_matches!(decode_chunked(b"4\r\nWi"), Ok(None));
        assert_matches!(decode_chunked(b"4\r\nWiki\r\n"), Ok(None));
        assert_matches!(decode_chunked(b"4\r\nWiki\r\n0\r\n"), Ok(None));
        assert_matches!(decode_chunked(b"4\r\nWiki\r\n0\r\n\r"), Ok(None));
    }

    #[test]
    fn bad_chunk_data_terminator_rejected() {
        assert_matches!(
            decode_chunked(b"4\r\nWikiXX0\r\n\r\n"),
            Err(err) if *err.get_ref() == HttpError::InvalidChunk
        );
    }

    #[test]
    fn hex_chunk_sizes() {
        let buf = b"A\r\n0123456789\r\n0\r\n\r\n";
        let (body, _) = decode_chunked(buf).unwrap().unwrap();
        assert_eq!(body, b"0123456789");
    }

    #[test]
    fn nonempty_trailer_rejected() {
        assert_matches!(
            decode_chunked(b"0\r\nX-Trailer: v\r\n\r\n"),
            Err(err) if *err.get_ref() == HttpError::InvalidChunk
        );
    }
}
