//! JSON Pointer (RFC 6901).

use wirekit_common::{bail_attach, ensure_attach, Result};

use crate::error::JsonError;
use crate::value::{Object, Value};

//
// public types
//

/// A parsed RFC 6901 pointer: the decoded reference tokens, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pointer {
    tokens: Vec<String>,
}

/// The site a pointer resolves to within a target document.
///
/// The final token is resolved against its parent container, so mutating operations can act on
/// the parent directly. A member key need not exist yet; `add` uses that to create it.
#[derive(Debug)]
pub enum Location<'a> {
    /// The empty pointer: the whole document.
    Root,

    /// An object member site: the parent object and the final token as its key.
    Member(&'a mut Object, String),

    /// An array element site: the parent array and the resolved index, at most `len`.
    Element(&'a mut Vec<Value>, usize),
}

//
// Pointer impls
//

impl Pointer {
    /// Parses a pointer string, decoding `~1` to `/` and `~0` to `~`.
    ///
    /// The empty string denotes the root; any other pointer must start with `/`.
    pub fn parse(text: &str) -> Result<Self, JsonError> {
        if text.is_empty() {
            return Ok(Self { tokens: Vec::new() });
        }
        ensure_attach!(text.starts_with('/'), JsonError::InvalidPointer(text.to_owned()));
        let mut tokens = Vec::new();
        for token in text[1..].split('/') {
            match decode_token(token) {
                Some(decoded) => tokens.push(decoded),
                None => bail_attach!(JsonError::InvalidPointer(text.to_owned())),
            }
        }
        Ok(Self { tokens })
    }

    /// The decoded reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether this is the empty pointer.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `self` addresses an ancestor of what `other` addresses.
    pub fn is_proper_prefix_of(&self, other: &Pointer) -> bool {
        self.tokens.len() < other.tokens.len()
            && other.tokens[..self.tokens.len()] == self.tokens[..]
    }

    /// Resolves the pointer for reading: every token, including the last, must exist.
    pub fn get<'a>(&self, root: &'a Value) -> Result<&'a Value, JsonError> {
        let mut current = root;
        for token in &self.tokens {
            current = match current {
                Value::Object(object) => match object.get(token) {
                    Some(value) => value,
                    None => bail_attach!(JsonError::PathNotFound),
                },
                Value::Array(values) => {
                    let index = parse_index(token)?;
                    ensure_attach!(index < values.len(), JsonError::IndexOutOfRange);
                    &values[index]
                }
                _ => bail_attach!(JsonError::PathNotFound),
            };
        }
        Ok(current)
    }

    /// Resolves the parent of the final token for mutation.
    ///
    /// Intermediate tokens must resolve strictly; only the terminal site may name a missing
    /// object key or the one-past-the-end array index (`-` or `len`).
    pub fn locate<'a>(&self, root: &'a mut Value) -> Result<Location<'a>, JsonError> {
        let Some((last, path)) = self.tokens.split_last() else {
            return Ok(Location::Root);
        };
        let mut current = root;
        for token in path {
            current = match current {
                Value::Object(object) => match object.get_mut(token) {
                    Some(value) => value,
                    None => bail_attach!(JsonError::PathNotFound),
                },
                Value::Array(values) => {
                    let index = parse_index(token)?;
                    ensure_attach!(index < values.len(), JsonError::IndexOutOfRange);
                    &mut values[index]
                }
                _ => bail_attach!(JsonError::PathNotFound),
            };
        }
        match current {
            Value::Object(object) => Ok(Location::Member(object, last.clone())),
            Value::Array(values) => {
                let index = if last == "-" { values.len() } else { parse_index(last)? };
                ensure_attach!(index <= values.len(), JsonError::IndexOutOfRange);
                Ok(Location::Element(values, index))
            }
            _ => bail_attach!(JsonError::PathNotFound),
        }
    }
}

//
// private functions
//

fn decode_token(token: &str) -> Option<String> {
    let mut decoded = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => decoded.push('~'),
            Some('1') => decoded.push('/'),
            _ => return None,
        }
    }
    Some(decoded)
}

// Array index tokens are base-10 without leading zeros; `-` is handled by the caller.
fn parse_index(token: &str) -> Result<usize, JsonError> {
    ensure_attach!(
        !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()),
        JsonError::InvalidPointer(token.to_owned())
    );
    ensure_attach!(
        token == "0" || !token.starts_with('0'),
        JsonError::InvalidPointer(token.to_owned())
    );
    token.parse().map_err(|_| JsonError::InvalidPointer(token.to_owned()).into())
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    // The RFC 6901 §5 example document.
    fn example() -> Value {
        Value::parse(
            r#"{"foo":["bar","baz"],"":0,"a/b":1,"c%d":2,"e^f":3,"g|h":4,"i\\j":5,"k\"l":6," ":7,"m~n":8}"#,
        )
        .unwrap()
    }

    #[test]
    fn rfc_example_evaluations() {
        let doc = example();
        let cases = [
            ("", r#"{"foo":["bar","baz"],"":0,"a/b":1,"c%d":2,"e^f":3,"g|h":4,"i\\j":5,"k\"l":6," ":7,"m~n":8}"#),
            ("/foo", r#"["bar","baz"]"#),
            ("/foo/0", r#""bar""#),
            ("/", "0"),
            ("/a~1b", "1"),
            ("/c%d", "2"),
            ("/e^f", "3"),
            ("/g|h", "4"),
            ("/i\\j", "5"),
            ("/k\"l", "6"),
            ("/ ", "7"),
            ("/m~0n", "8"),
        ];
        for (pointer, expected) in cases {
            let pointer = Pointer::parse(pointer).unwrap();
            assert_eq!(pointer.get(&doc).unwrap(), &Value::parse(expected).unwrap());
        }
    }

    #[test]
    fn missing_leading_slash_rejected() {
        assert_matches!(
            Pointer::parse("foo"),
            Err(err) if matches!(err.get_ref(), JsonError::InvalidPointer(_))
        );
    }

    #[test]
    fn bad_tilde_escape_rejected() {
        for text in ["/~", "/~2", "/a~x"] {
            assert_matches!(
                Pointer::parse(text),
                Err(err) if matches!(err.get_ref(), JsonError::InvalidPointer(_)),
                "{text}"
            );
        }
    }

    #[test]
    fn missing_member_not_found() {
        let doc = example();
        let pointer = Pointer::parse("/nope").unwrap();
        assert_matches!(
            pointer.get(&doc),
            Err(err) if *err.get_ref() == JsonError::PathNotFound
        );
    }

    #[test]
    fn array_index_rules() {
        let doc = example();
        for (text, error) in [
            ("/foo/2", JsonError::IndexOutOfRange),
            ("/foo/01", JsonError::InvalidPointer("01".to_owned())),
            ("/foo/x", JsonError::InvalidPointer("x".to_owned())),
            ("/foo/-1", JsonError::InvalidPointer("-1".to_owned())),
        ] {
            let pointer = Pointer::parse(text).unwrap();
            assert_matches!(pointer.get(&doc), Err(err) if *err.get_ref() == error, "{text}");
        }
    }

    #[test]
    fn locate_terminal_sites() {
        let mut doc = example();
        let pointer = Pointer::parse("/foo/-").unwrap();
        assert_matches!(pointer.locate(&mut doc).unwrap(), Location::Element(_, 2));

        let pointer = Pointer::parse("/new-key").unwrap();
        assert_matches!(pointer.locate(&mut doc).unwrap(), Location::Member(_, key) if key == "new-key");

        let pointer = Pointer::parse("").unwrap();
        assert_matches!(pointer.locate(&mut doc).unwrap(), Location::Root);
    }

    #[test]
    fn locate_rejects_missing_intermediate() {
        let mut doc = example();
        let pointer = Pointer::parse("/nope/0").unwrap();
        assert_matches!(
            pointer.locate(&mut doc),
            Err(err) if *err.get_ref() == JsonError::PathNotFound
        );
    }

    #[test]
    fn proper_prefix() {
        let a = Pointer::parse("/a/b").unwrap();
        let b = Pointer::parse("/a/b/c").unwrap();
        assert!(a.is_proper_prefix_of(&b));
        assert!(!b.is_proper_prefix_of(&a));
        assert!(!a.is_proper_prefix_of(&a));
        assert!(Pointer::parse("").unwrap().is_proper_prefix_of(&a));
    }
}
