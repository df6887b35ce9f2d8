//! The event-driven JSON parser (RFC 8259).
//!
//! The parser pushes events into a [`Handler`] as it walks the grammar; the tree builder and the
//! serializer sit on the two ends of the same interface. Input is consumed exclusively through
//! the [`Source`] abstraction so callers can feed the parser from accumulated buffers.

use wirekit_common::{bail_attach, ensure_attach, Result};

use crate::error::JsonError;

//
// public types
//

/// An abstract character source the parser consumes from.
pub trait Source {
    /// Whether the source is out of bytes.
    fn eof(&self) -> bool;

    /// The next byte, without consuming it.
    fn peek(&self) -> Option<u8>;

    /// Consumes and returns the next byte.
    fn bump(&mut self) -> Option<u8>;

    /// Consumes `count` bytes; `false` when fewer remain.
    fn advance(&mut self, count: usize) -> bool;

    /// Copies the next `buf.len()` bytes without consuming them; `false` when fewer remain.
    fn fetch(&mut self, buf: &mut [u8]) -> bool;

    /// Copies and consumes the next `buf.len()` bytes; `false` when fewer remain.
    fn read(&mut self, buf: &mut [u8]) -> bool;
}

/// A [`Source`] over an in-memory string.
#[derive(Clone, Debug)]
pub struct StrSource<'a> {
    bytes: &'a [u8],
    offset: usize,
}

/// The receiver of parse events.
///
/// Every method defaults to accepting; returning `false` from any callback aborts the parse
/// with [`JsonError::Aborted`]. The serializer drives this same interface when rendering a tree
/// back to text.
#[allow(unused_variables)]
pub trait Handler {
    fn start_document(&mut self) -> bool {
        true
    }

    fn end_document(&mut self) -> bool {
        true
    }

    fn start_array(&mut self) -> bool {
        true
    }

    fn end_array(&mut self, count: usize) -> bool {
        true
    }

    fn start_object(&mut self) -> bool {
        true
    }

    fn key(&mut self, key: &str) -> bool {
        true
    }

    fn end_object(&mut self, count: usize) -> bool {
        true
    }

    fn start_member(&mut self, index: usize) -> bool {
        true
    }

    fn end_member(&mut self) -> bool {
        true
    }

    fn start_value(&mut self) -> bool {
        true
    }

    fn end_value(&mut self) -> bool {
        true
    }

    fn string(&mut self, value: &str) -> bool {
        true
    }

    fn null(&mut self) -> bool {
        true
    }

    fn boolean(&mut self, value: bool) -> bool {
        true
    }

    fn number(&mut self, text: &str) -> bool {
        true
    }
}

/// The push parser: walks the grammar over a [`Source`], emitting events into its [`Handler`].
pub struct Parser<'a, H> {
    handler: &'a mut H,
}

//
// StrSource impls
//

impl<'a> StrSource<'a> {
    /// Construct a new `StrSource` over `text`.
    pub fn new(text: &'a str) -> Self {
        Self { bytes: text.as_bytes(), offset: 0 }
    }
}

impl Source for StrSource<'_> {
    fn eof(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.offset += 1;
        Some(byte)
    }

    fn advance(&mut self, count: usize) -> bool {
        if count <= self.bytes.len() - self.offset {
            self.offset += count;
            true
        } else {
            false
        }
    }

    fn fetch(&mut self, buf: &mut [u8]) -> bool {
        match self.bytes.get(self.offset..self.offset + buf.len()) {
            Some(bytes) => {
                buf.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> bool {
        if self.fetch(buf) {
            self.offset += buf.len();
            true
        } else {
            false
        }
    }
}

//
// Parser impls
//

impl<'a, H: Handler> Parser<'a, H> {
    /// Construct a new `Parser` pushing into `handler`.
    pub fn new(handler: &'a mut H) -> Self {
        Self { handler }
    }

    /// Parses one complete document: `ws value ws`, then end of input.
    pub fn parse<S: Source>(&mut self, source: &mut S) -> Result<(), JsonError> {
        accepted(self.handler.start_document())?;
        skip_whitespace(source);
        self.parse_value(source)?;
        skip_whitespace(source);
        ensure_attach!(source.eof(), JsonError::TrailingInput);
        accepted(self.handler.end_document())?;
        Ok(())
    }

    fn parse_value<S: Source>(&mut self, source: &mut S) -> Result<(), JsonError> {
        accepted(self.handler.start_value())?;
        match source.peek() {
            Some(b'{') => self.parse_object(source)?,
            Some(b'[') => self.parse_array(source)?,
            Some(b'"') => {
                let string = parse_string(source)?;
                accepted(self.handler.string(&string))?;
            }
            Some(b't') => {
                expect_literal(source, b"true")?;
                accepted(self.handler.boolean(true))?;
            }
            Some(b'f') => {
                expect_literal(source, b"false")?;
                accepted(self.handler.boolean(false))?;
            }
            Some(b'n') => {
                expect_literal(source, b"null")?;
                accepted(self.handler.null())?;
            }
            Some(_) => {
                let text = parse_number(source)?;
                accepted(self.handler.number(&text))?;
            }
            None => bail_attach!(JsonError::UnexpectedEnd),
        }
        accepted(self.handler.end_value())?;
        Ok(())
    }

    fn parse_object<S: Source>(&mut self, source: &mut S) -> Result<(), JsonError> {
        expect_byte(source, b'{')?;
        accepted(self.handler.start_object())?;
        skip_whitespace(source);
        let mut count = 0;
        while source.peek() != Some(b'}') {
            accepted(self.handler.start_member(count))?;
            if count > 0 {
                expect_byte(source, b',')?;
                skip_whitespace(source);
            }
            let key = parse_string(source)?;
            accepted(self.handler.key(&key))?;
            skip_whitespace(source);
            expect_byte(source, b':')?;
            skip_whitespace(source);
            self.parse_value(source)?;
            accepted(self.handler.end_member())?;
            skip_whitespace(source);
            count += 1;
        }
        expect_byte(source, b'}')?;
        accepted(self.handler.end_object(count))?;
        Ok(())
    }

    fn parse_array<S: Source>(&mut self, source: &mut S) -> Result<(), JsonError> {
        expect_byte(source, b'[')?;
        accepted(self.handler.start_array())?;
        skip_whitespace(source);
        let mut count = 0;
        while source.peek() != Some(b']') {
            accepted(self.handler.start_member(count))?;
            if count > 0 {
                expect_byte(source, b',')?;
                skip_whitespace(source);
            }
            self.parse_value(source)?;
            accepted(self.handler.end_member())?;
            skip_whitespace(source);
            count += 1;
        }
        expect_byte(source, b']')?;
        accepted(self.handler.end_array(count))?;
        Ok(())
    }
}

//
// private functions
//

fn accepted(ok: bool) -> Result<(), JsonError> {
    ensure_attach!(ok, JsonError::Aborted);
    Ok(())
}

fn skip_whitespace<S: Source>(source: &mut S) {
    while let Some(byte) = source.peek() {
        match byte {
            b' ' | b'\t' | b'\r' | b'\n' => {
                source.bump();
            }
            _ => break,
        }
    }
}

fn expect_byte<S: Source>(source: &mut S, expected: u8) -> Result<(), JsonError> {
    match source.bump() {
        Some(byte) if byte == expected => Ok(()),
        Some(byte) => bail_attach!(JsonError::UnexpectedCharacter(char::from(byte))),
        None => bail_attach!(JsonError::UnexpectedEnd),
    }
}

fn expect_literal<S: Source>(source: &mut S, literal: &'static [u8]) -> Result<(), JsonError> {
    let mut buf = [0u8; 8];
    let buf = &mut buf[..literal.len()];
    ensure_attach!(source.read(buf), JsonError::UnexpectedEnd);
    ensure_attach!(
        buf == literal,
        JsonError::UnexpectedCharacter(char::from(buf[0])),
    );
    Ok(())
}

fn parse_string<S: Source>(source: &mut S) -> Result<String, JsonError> {
    expect_byte(source, b'"')?;
    let mut buf = Vec::new();
    loop {
        let byte = match source.bump() {
            Some(byte) => byte,
            None => bail_attach!(JsonError::UnexpectedEnd),
        };
        match byte {
            b'"' => break,
            b'\\' => match source.bump() {
                Some(b'"') => buf.push(b'"'),
                Some(b'\\') => buf.push(b'\\'),
                Some(b'/') => buf.push(b'/'),
                Some(b'b') => buf.push(0x08),
                Some(b'f') => buf.push(0x0C),
                Some(b'n') => buf.push(b'\n'),
                Some(b'r') => buf.push(b'\r'),
                Some(b't') => buf.push(b'\t'),
                Some(b'u') => {
                    let scalar = parse_unicode_escape(source)?;
                    let mut encoded = [0u8; 4];
                    buf.extend_from_slice(scalar.encode_utf8(&mut encoded).as_bytes());
                }
                Some(_) => bail_attach!(JsonError::InvalidEscape),
                None => bail_attach!(JsonError::UnexpectedEnd),
            },
            0x00..=0x1F => bail_attach!(JsonError::ControlCharacter),
            _ => buf.push(byte),
        }
    }
    String::from_utf8(buf).map_err(|_| JsonError::InvalidUtf8.into())
}

// A high surrogate must be immediately followed by an escaped low surrogate; the pair combines
// into one code point.
fn parse_unicode_escape<S: Source>(source: &mut S) -> Result<char, JsonError> {
    let first = parse_hex4(source)?;
    let scalar = match first {
        0xD800..=0xDBFF => {
            let mut escape = [0u8; 2];
            ensure_attach!(source.read(&mut escape), JsonError::UnexpectedEnd);
            ensure_attach!(escape == *b"\\u", JsonError::InvalidSurrogatePair);
            let second = parse_hex4(source)?;
            ensure_attach!(
                (0xDC00..=0xDFFF).contains(&second),
                JsonError::InvalidSurrogatePair
            );
            0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00)
        }
        0xDC00..=0xDFFF => bail_attach!(JsonError::InvalidSurrogatePair),
        scalar => u32::from(scalar),
    };
    char::from_u32(scalar).ok_or_else(|| JsonError::InvalidSurrogatePair.into())
}

fn parse_hex4<S: Source>(source: &mut S) -> Result<u16, JsonError> {
    let mut digits = [0u8; 4];
    ensure_attach!(source.read(&mut digits), JsonError::UnexpectedEnd);
    let mut value = 0u16;
    for digit in digits {
        let nibble = match digit {
            b'0'..=b'9' => digit - b'0',
            b'a'..=b'f' => digit - b'a' + 10,
            b'A'..=b'F' => digit - b'A' + 10,
            _ => bail_attach!(JsonError::InvalidEscape),
        };
        value = (value << 4) | u16::from(nibble);
    }
    Ok(value)
}

fn parse_number<S: Source>(source: &mut S) -> Result<String, JsonError> {
    let mut text = String::new();
    if source.peek() == Some(b'-') {
        source.bump();
        text.push('-');
    }
    match source.peek() {
        Some(b'0') => {
            source.bump();
            text.push('0');
        }
        Some(b'1'..=b'9') => parse_digits(source, &mut text)?,
        Some(byte) => bail_attach!(JsonError::UnexpectedCharacter(char::from(byte))),
        None => bail_attach!(JsonError::UnexpectedEnd),
    }
    if source.peek() == Some(b'.') {
        source.bump();
        text.push('.');
        parse_digits(source, &mut text)?;
    }
    if let Some(byte @ (b'e' | b'E')) = source.peek() {
        source.bump();
        text.push(char::from(byte));
        if let Some(sign @ (b'+' | b'-')) = source.peek() {
            source.bump();
            text.push(char::from(sign));
        }
        parse_digits(source, &mut text)?;
    }
    Ok(text)
}

fn parse_digits<S: Source>(source: &mut S, text: &mut String) -> Result<(), JsonError> {
    let mut any = false;
    while let Some(byte @ b'0'..=b'9') = source.peek() {
        source.bump();
        text.push(char::from(byte));
        any = true;
    }
    if !any {
        match source.peek() {
            Some(byte) => bail_attach!(JsonError::UnexpectedCharacter(char::from(byte))),
            None => bail_attach!(JsonError::UnexpectedEnd),
        }
    }
    Ok(())
}
