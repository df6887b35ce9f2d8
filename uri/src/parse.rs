//! The URI model and its grammar-driven parsers (RFC 3986 §3).
//!
//! Components are stored with in-class percent-triplets decoded; triplets encoding bytes
//! outside their component's class are kept verbatim, and the serializer re-encodes per class,
//! so a canonical input re-serializes to itself.

use wirekit_common::{bail_attach, ensure_attach, Result};

use crate::chars;
use crate::error::UriError;

//
// public types
//

/// A parsed URI or URI reference: five optional parts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Uri {
    pub scheme: Option<String>,
    pub authority: Option<Authority>,
    pub path: Path,
    pub query: Option<Query>,
    pub fragment: Option<String>,
}

/// The authority component: `[ userinfo "@" ] host [ ":" port ]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Authority {
    pub userinfo: Option<String>,
    pub host: String,

    /// Whether the host was bracketed (`[...]`); re-serialization restores the brackets.
    pub literal: bool,

    /// The port digits; present (possibly empty) whenever the authority carried a `:`.
    pub port: Option<String>,
}

/// A path: a sequence of segments, each carrying its leading `/` if any.
///
/// Re-serialization is plain concatenation; keeping the slash inside the segment also gives the
/// merge and dot-segment-removal algorithms their natural shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<String>,
    pub kind: PathKind,
}

/// The grammar production a path was parsed under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PathKind {
    /// `*( "/" segment )` — follows an authority.
    AbEmpty,
    /// `"/" [ segment-nz *( "/" segment ) ]`.
    Absolute,
    /// `segment-nz-nc *( "/" segment )` — first segment must not contain `:`.
    NoScheme,
    /// `segment-nz *( "/" segment )`.
    Rootless,
    /// Zero characters.
    #[default]
    Empty,
}

/// The query component: the raw text plus its `key [= value]` parameters in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub raw: String,
    pub params: Vec<Param>,
}

/// One query parameter. `has_equals` distinguishes `?key` from `?key=`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub has_equals: bool,
    pub value: String,
}

//
// Uri impls
//

impl Uri {
    /// Parses a full URI: `scheme ":" hier-part [ "?" query ] [ "#" fragment ]`.
    pub fn parse(text: &str) -> Result<Self, UriError> {
        let mut cursor = Cursor::new(text);
        let uri = parse_uri(&mut cursor)?;
        ensure_attach!(cursor.is_empty(), UriError::TrailingInput);
        Ok(uri)
    }

    /// Parses a URI reference: a full URI, or a relative reference.
    pub fn parse_reference(text: &str) -> Result<Self, UriError> {
        if let Ok(uri) = Self::parse(text) {
            return Ok(uri);
        }
        let mut cursor = Cursor::new(text);
        let mut uri = Uri::default();
        uri.path = parse_relative_part(&mut cursor, &mut uri.authority)?;
        parse_query_and_fragment(&mut cursor, &mut uri);
        ensure_attach!(cursor.is_empty(), UriError::TrailingInput);
        Ok(uri)
    }

    /// Parses an absolute URI: a full URI without a fragment.
    pub fn parse_absolute(text: &str) -> Result<Self, UriError> {
        let mut cursor = Cursor::new(text);
        let mut uri = Uri::default();
        uri.scheme = Some(parse_scheme(&mut cursor)?);
        uri.path = parse_hier_part(&mut cursor, &mut uri.authority)?;
        if cursor.eat(b'?') {
            uri.query = Some(parse_query(&mut cursor));
        }
        ensure_attach!(cursor.is_empty(), UriError::TrailingInput);
        Ok(uri)
    }

    /// Parses the origin-form request target: `path-absolute [ "?" query ]`.
    pub fn parse_origin_form(text: &str) -> Result<Self, UriError> {
        let mut cursor = Cursor::new(text);
        let mut uri = Uri::default();
        match parse_path_absolute(&mut cursor) {
            Some(path) => uri.path = path,
            None => bail_attach!(UriError::InvalidPath),
        }
        if cursor.eat(b'?') {
            uri.query = Some(parse_query(&mut cursor));
        }
        ensure_attach!(cursor.is_empty(), UriError::TrailingInput);
        Ok(uri)
    }

    /// Parses the authority-form request target: a bare authority.
    pub fn parse_authority_form(text: &str) -> Result<Self, UriError> {
        let mut cursor = Cursor::new(text);
        let authority = parse_authority(&mut cursor)?;
        ensure_attach!(cursor.is_empty(), UriError::TrailingInput);
        Ok(Uri { authority: Some(authority), ..Default::default() })
    }
}

//
// Path impls
//

impl Path {
    /// The path as text: plain concatenation of the slash-carrying segments.
    pub fn text(&self) -> String {
        self.segments.concat()
    }

    /// Whether the path serializes to zero characters.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(String::is_empty)
    }

    /// Whether the path starts with `/`.
    pub fn is_absolute(&self) -> bool {
        self.segments.first().is_some_and(|segment| segment.starts_with('/'))
    }
}

impl Default for Path {
    fn default() -> Self {
        Self { segments: Vec::new(), kind: PathKind::Empty }
    }
}

//
// parse cursor
//

pub(crate) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn bytes(&self) -> &'a [u8] {
        &self.text.as_bytes()[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().first().copied()
    }

    fn mark(&self) -> usize {
        self.pos
    }

    fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, prefix: &str) -> bool {
        if self.text[self.pos..].starts_with(prefix) {
            self.pos += prefix.len();
            true
        } else {
            false
        }
    }

    fn eat_class(&mut self, class: fn(u8) -> bool) -> Option<u8> {
        match self.peek() {
            Some(byte) if class(byte) => {
                self.pos += 1;
                Some(byte)
            }
            _ => None,
        }
    }

    /// A percent triplet at the cursor: the decoded byte and its source text.
    fn peek_triplet(&self) -> Option<(u8, &'a str)> {
        let bytes = self.bytes();
        match *bytes {
            [b'%', hi, lo, ..] => {
                let decoded = chars::hex_value(hi)? * 16 + chars::hex_value(lo)?;
                Some((decoded, &self.text[self.pos..self.pos + 3]))
            }
            _ => None,
        }
    }

    /// Consumes class bytes and percent triplets, decoding triplets whose byte is in `class`
    /// and keeping the others verbatim.
    fn take_component(&mut self, class: fn(u8) -> bool) -> String {
        let mut out = String::new();
        loop {
            if let Some(byte) = self.eat_class(class) {
                out.push(char::from(byte));
                continue;
            }
            if let Some((decoded, raw)) = self.peek_triplet() {
                self.pos += 3;
                if class(decoded) {
                    out.push(char::from(decoded));
                } else {
                    out.push_str(raw);
                }
                continue;
            }
            return out;
        }
    }
}

//
// parser internals, shared with the resolver
//

pub(crate) fn parse_uri(cursor: &mut Cursor<'_>) -> Result<Uri, UriError> {
    let mut uri = Uri { scheme: Some(parse_scheme(cursor)?), ..Default::default() };
    uri.path = parse_hier_part(cursor, &mut uri.authority)?;
    parse_query_and_fragment(cursor, &mut uri);
    Ok(uri)
}

fn parse_scheme(cursor: &mut Cursor<'_>) -> Result<String, UriError> {
    let mut scheme = String::new();
    match cursor.eat_class(chars::is_alpha) {
        Some(byte) => scheme.push(char::from(byte)),
        None => bail_attach!(UriError::MissingScheme),
    }
    while let Some(byte) = cursor.eat_class(chars::is_scheme) {
        scheme.push(char::from(byte));
    }
    ensure_attach!(cursor.eat(b':'), UriError::InvalidScheme);
    Ok(scheme)
}

fn parse_hier_part(
    cursor: &mut Cursor<'_>,
    authority: &mut Option<Authority>,
) -> Result<Path, UriError> {
    if cursor.eat_str("//") {
        *authority = Some(parse_authority(cursor)?);
        return Ok(parse_path_abempty(cursor));
    }
    if let Some(path) = parse_path_absolute(cursor) {
        return Ok(path);
    }
    if let Some(path) = parse_path_rootless(cursor) {
        return Ok(path);
    }
    Ok(Path::default())
}

// The relative-part grammar swaps path-rootless for path-noscheme: a first segment containing
// `:` would be indistinguishable from a scheme.
pub(crate) fn parse_relative_part(
    cursor: &mut Cursor<'_>,
    authority: &mut Option<Authority>,
) -> Result<Path, UriError> {
    if cursor.eat_str("//") {
        *authority = Some(parse_authority(cursor)?);
        return Ok(parse_path_abempty(cursor));
    }
    if let Some(path) = parse_path_absolute(cursor) {
        return Ok(path);
    }
    if let Some(path) = parse_path_noscheme(cursor) {
        return Ok(path);
    }
    Ok(Path::default())
}

fn parse_query_and_fragment(cursor: &mut Cursor<'_>, uri: &mut Uri) {
    if cursor.eat(b'?') {
        uri.query = Some(parse_query(cursor));
    }
    if cursor.eat(b'#') {
        uri.fragment = Some(cursor.take_component(chars::is_fragment));
    }
}

fn parse_authority(cursor: &mut Cursor<'_>) -> Result<Authority, UriError> {
    let mut authority = Authority::default();

    let mark = cursor.mark();
    let userinfo = cursor.take_component(chars::is_userinfo);
    if cursor.eat(b'@') {
        authority.userinfo = Some(userinfo);
    } else {
        cursor.reset(mark);
    }

    parse_host(cursor, &mut authority)?;

    if cursor.eat(b':') {
        authority.port = Some(cursor.take_component(chars::is_digit));
    }
    Ok(authority)
}

fn parse_host(cursor: &mut Cursor<'_>, authority: &mut Authority) -> Result<(), UriError> {
    if cursor.eat(b'[') {
        let content_start = cursor.mark();
        while cursor.peek().is_some() && cursor.peek() != Some(b']') {
            cursor.pos += 1;
        }
        let content = &cursor.text[content_start..cursor.pos];
        ensure_attach!(cursor.eat(b']'), UriError::InvalidHost);
        ensure_attach!(
            is_ipvfuture(content) || is_ipv6_address(content),
            UriError::InvalidHost
        );
        authority.host = content.to_owned();
        authority.literal = true;
        return Ok(());
    }

    let mark = cursor.mark();
    if let Some(host) = parse_ipv4(cursor) {
        // An IPv4 match is only a host when the authority actually ends here; otherwise the
        // dotted prefix belongs to a longer reg-name.
        if matches!(cursor.peek(), None | Some(b':') | Some(b'/') | Some(b'?') | Some(b'#')) {
            authority.host = host;
            authority.literal = false;
            return Ok(());
        }
        cursor.reset(mark);
    }

    authority.host = cursor.take_component(chars::is_regname);
    authority.literal = false;
    Ok(())
}

fn parse_ipv4(cursor: &mut Cursor<'_>) -> Option<String> {
    let mark = cursor.mark();
    for index in 0..4 {
        if index > 0 && !cursor.eat(b'.') {
            cursor.reset(mark);
            return None;
        }
        if !eat_dec_octet(cursor) {
            cursor.reset(mark);
            return None;
        }
    }
    Some(cursor.text[mark..cursor.pos].to_owned())
}

fn eat_dec_octet(cursor: &mut Cursor<'_>) -> bool {
    for prefix in ["25", "2", "1", ""] {
        let mark = cursor.mark();
        if !cursor.eat_str(prefix) {
            continue;
        }
        let matched = match prefix {
            "25" => cursor.eat_class(|b| (b'0'..=b'5').contains(&b)).is_some(),
            "2" => {
                cursor.eat_class(|b| (b'0'..=b'4').contains(&b)).is_some()
                    && cursor.eat_class(chars::is_digit).is_some()
            }
            "1" => {
                cursor.eat_class(chars::is_digit).is_some()
                    && cursor.eat_class(chars::is_digit).is_some()
            }
            _ => match cursor.eat_class(chars::is_digit) {
                Some(b'1'..=b'9') => {
                    cursor.eat_class(chars::is_digit);
                    true
                }
                Some(b'0') => true,
                _ => false,
            },
        };
        if matched {
            return true;
        }
        cursor.reset(mark);
    }
    false
}

fn is_ipvfuture(content: &str) -> bool {
    let bytes = content.as_bytes();
    let Some((b'v' | b'V', rest)) = bytes.split_first() else {
        return false;
    };
    let hex_len = rest.iter().take_while(|&&b| chars::is_hexdig(b)).count();
    if hex_len == 0 {
        return false;
    }
    let Some((b'.', rest)) = rest[hex_len..].split_first() else {
        return false;
    };
    !rest.is_empty() && rest.iter().all(|&b| chars::is_ipvfuture(b))
}

fn is_ipv6_address(content: &str) -> bool {
    if content.matches("::").count() > 1 {
        return false;
    }
    let (head, tail, compressed) = match content.split_once("::") {
        Some((head, tail)) => (head, tail, true),
        None => (content, "", false),
    };
    let count_groups = |part: &str| -> Option<usize> {
        if part.is_empty() {
            return Some(0);
        }
        let mut groups = part.split(':').collect::<Vec<_>>();
        let mut count = 0;
        if let Some(last) = groups.last() {
            if last.contains('.') {
                if !is_ipv4_text(last) {
                    return None;
                }
                groups.pop();
                count += 2;
            }
        }
        for group in groups {
            let valid = (1..=4).contains(&group.len())
                && group.bytes().all(chars::is_hexdig);
            if !valid {
                return None;
            }
            count += 1;
        }
        Some(count)
    };
    let Some(head_count) = count_groups(head) else {
        return false;
    };
    let Some(tail_count) = count_groups(tail) else {
        return false;
    };
    if compressed {
        head_count + tail_count < 8
    } else {
        head_count == 8
    }
}

fn is_ipv4_text(text: &str) -> bool {
    let mut cursor = Cursor::new(text);
    parse_ipv4(&mut cursor).is_some() && cursor.is_empty()
}

fn parse_path_abempty(cursor: &mut Cursor<'_>) -> Path {
    let mut segments = Vec::new();
    while let Some(segment) = parse_segment(cursor, true, false, false) {
        segments.push(segment);
    }
    Path { segments, kind: PathKind::AbEmpty }
}

fn parse_path_absolute(cursor: &mut Cursor<'_>) -> Option<Path> {
    if !cursor.eat(b'/') {
        return None;
    }
    let mut segments = Vec::new();
    match parse_segment(cursor, false, true, false) {
        Some(first) => segments.push(format!("/{first}")),
        None => {
            // A bare slash keeps its own segment.
            return Some(Path { segments: vec!["/".to_owned()], kind: PathKind::Absolute });
        }
    }
    while let Some(segment) = parse_segment(cursor, true, false, false) {
        segments.push(segment);
    }
    Some(Path { segments, kind: PathKind::Absolute })
}

fn parse_path_noscheme(cursor: &mut Cursor<'_>) -> Option<Path> {
    let mut segments = vec![parse_segment(cursor, false, true, true)?];
    while let Some(segment) = parse_segment(cursor, true, false, false) {
        segments.push(segment);
    }
    Some(Path { segments, kind: PathKind::NoScheme })
}

fn parse_path_rootless(cursor: &mut Cursor<'_>) -> Option<Path> {
    let mut segments = vec![parse_segment(cursor, false, true, false)?];
    while let Some(segment) = parse_segment(cursor, true, false, false) {
        segments.push(segment);
    }
    Some(Path { segments, kind: PathKind::Rootless })
}

fn parse_segment(
    cursor: &mut Cursor<'_>,
    leading_slash: bool,
    nonzero: bool,
    no_colon: bool,
) -> Option<String> {
    let mark = cursor.mark();
    let mut segment = String::new();
    if leading_slash {
        if !cursor.eat(b'/') {
            return None;
        }
        segment.push('/');
    }
    let class = if no_colon { chars::is_pchar_nc } else { chars::is_pchar };
    segment.push_str(&cursor.take_component(class));
    if nonzero && segment.len() <= usize::from(leading_slash) {
        cursor.reset(mark);
        return None;
    }
    Some(segment)
}

fn parse_query(cursor: &mut Cursor<'_>) -> Query {
    let start = cursor.mark();
    let mut params = Vec::new();
    let mut param = Param::default();
    loop {
        if let Some(byte) = cursor.eat_class(chars::is_query) {
            match byte {
                b'=' if !param.has_equals => param.has_equals = true,
                b'&' => params.push(std::mem::take(&mut param)),
                byte if !param.has_equals => param.key.push(char::from(byte)),
                byte => param.value.push(char::from(byte)),
            }
            continue;
        }
        if let Some((decoded, raw)) = cursor.peek_triplet() {
            cursor.pos += 3;
            let target = if param.has_equals { &mut param.value } else { &mut param.key };
            if chars::is_query(decoded) {
                target.push(char::from(decoded));
            } else {
                target.push_str(raw);
            }
            continue;
        }
        break;
    }
    if param != Param::default() {
        params.push(param);
    }
    Query { raw: cursor.text[start..cursor.pos].to_owned(), params }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn full_uri_parses() {
        let uri = Uri::parse("http://user@example.com:8080/a/b?k=v&flag#frag").unwrap();
        assert_eq!(uri.scheme.as_deref(), Some("http"));
        let authority = uri.authority.as_ref().unwrap();
        assert_eq!(authority.userinfo.as_deref(), Some("user"));
        assert_eq!(authority.host, "example.com");
        assert!(!authority.literal);
        assert_eq!(authority.port.as_deref(), Some("8080"));
        assert_eq!(uri.path.segments, ["/a", "/b"]);
        assert_eq!(uri.path.kind, PathKind::AbEmpty);
        let query = uri.query.as_ref().unwrap();
        assert_eq!(query.params.len(), 2);
        assert_eq!(query.params[0].key, "k");
        assert!(query.params[0].has_equals);
        assert_eq!(query.params[0].value, "v");
        assert_eq!(query.params[1].key, "flag");
        assert!(!query.params[1].has_equals);
        assert_eq!(uri.fragment.as_deref(), Some("frag"));
    }

    #[test]
    fn scheme_required_for_uri() {
        assert_matches!(
            Uri::parse("//example.com/"),
            Err(err) if *err.get_ref() == UriError::MissingScheme
        );
        assert!(Uri::parse_reference("//example.com/").is_ok());
    }

    #[test]
    fn ipv4_hosts_recognized() {
        let uri = Uri::parse("http://192.168.0.1:80/").unwrap();
        let authority = uri.authority.unwrap();
        assert_eq!(authority.host, "192.168.0.1");
        assert!(!authority.literal);
    }

    #[test]
    fn dotted_reg_name_not_mistaken_for_ipv4() {
        let uri = Uri::parse("http://1.2.3.4.5/").unwrap();
        assert_eq!(uri.authority.unwrap().host, "1.2.3.4.5");
    }

    #[test]
    fn ipv6_literal_hosts() {
        for host in ["::1", "2001:db8::7", "::", "1:2:3:4:5:6:7:8", "::ffff:192.0.2.1"] {
            let uri = Uri::parse(&format!("http://[{host}]/")).unwrap();
            let authority = uri.authority.unwrap();
            assert_eq!(authority.host, host);
            assert!(authority.literal, "{host}");
        }
    }

    #[test]
    fn malformed_ipv6_rejected() {
        for host in ["1:2:3", "::1::2", "12345::", "g::1", "1:2:3:4:5:6:7:8:9"] {
            assert!(Uri::parse(&format!("http://[{host}]/")).is_err(), "{host}");
        }
    }

    #[test]
    fn ipvfuture_literal_hosts() {
        let uri = Uri::parse("http://[v1.fe80::a+en1]/").unwrap();
        let authority = uri.authority.unwrap();
        assert_eq!(authority.host, "v1.fe80::a+en1");
        assert!(authority.literal);
        assert!(Uri::parse("http://[v.1]/").is_err());
    }

    #[test]
    fn path_segments_keep_leading_slash() {
        let uri = Uri::parse("s://h/a//b/").unwrap();
        assert_eq!(uri.path.segments, ["/a", "/", "/b", "/"]);
    }

    #[test]
    fn rootless_and_noscheme_paths() {
        let uri = Uri::parse("urn:isbn:0451450523").unwrap();
        assert_eq!(uri.path.kind, PathKind::Rootless);
        assert_eq!(uri.path.text(), "isbn:0451450523");

        let reference = Uri::parse_reference("g;x=1/./y").unwrap();
        assert_eq!(reference.path.kind, PathKind::NoScheme);
        assert_eq!(reference.path.segments, ["g;x=1", "/.", "/y"]);
    }

    #[test]
    fn empty_reference_parses() {
        let uri = Uri::parse_reference("").unwrap();
        assert_eq!(uri, Uri::default());
    }

    #[test]
    fn percent_triplets_decode_per_class() {
        let uri = Uri::parse("http://ex%61mple.com/a%2Fb%20c").unwrap();
        // `a` is in reg-name's class and decodes; `/` and space are not in pchar and stay
        // encoded in the stored segment.
        assert_eq!(uri.authority.unwrap().host, "example.com");
        assert_eq!(uri.path.segments, ["/a%2Fb%20c"]);
    }

    #[test]
    fn empty_port_and_empty_host_allowed() {
        let uri = Uri::parse("http://example.com:/").unwrap();
        assert_eq!(uri.authority.unwrap().port.as_deref(), Some(""));
        let uri = Uri::parse("file:///etc/hosts").unwrap();
        assert_eq!(uri.authority.unwrap().host, "");
    }

    #[test]
    fn trailing_garbage_rejected() {
        assert_matches!(
            Uri::parse("http://example.com/%zz"),
            Err(err) if *err.get_ref() == UriError::TrailingInput
        );
        assert_matches!(
            Uri::parse("http://example.com/a b"),
            Err(err) if *err.get_ref() == UriError::TrailingInput
        );
    }

    #[test]
    fn query_params_split_in_order() {
        let uri = Uri::parse("s://h/?a=1&b&c=&a=2&&d=x%3Dy").unwrap();
        let query = uri.query.unwrap();
        let forms: Vec<_> = query
            .params
            .iter()
            .map(|p| (p.key.as_str(), p.has_equals, p.value.as_str()))
            .collect();
        assert_eq!(
            forms,
            [
                ("a", true, "1"),
                ("b", false, ""),
                ("c", true, ""),
                ("a", true, "2"),
                ("", false, ""),
                ("d", true, "x=y"),
            ]
        );
    }

    #[test]
    fn origin_form_targets() {
        let uri = Uri::parse_origin_form("/where?q=now").unwrap();
        assert_eq!(uri.path.text(), "/where");
        assert!(uri.query.is_some());
        assert!(Uri::parse_origin_form("where").is_err());
        assert!(Uri::parse_origin_form("/a#frag").is_err());
    }

    #[test]
    fn authority_form_targets() {
        let uri = Uri::parse_authority_form("example.com:8080").unwrap();
        let authority = uri.authority.unwrap();
        assert_eq!(authority.host, "example.com");
        assert_eq!(authority.port.as_deref(), Some("8080"));
        assert!(Uri::parse_authority_form("example.com/path").is_err());
    }
}
