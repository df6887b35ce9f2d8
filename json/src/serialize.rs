//! Rendering a value tree back to text.
//!
//! Serialization drives the same [`Handler`] interface the parser pushes into; [`Writer`] is the
//! output handler concatenating token fragments. No insignificant whitespace is emitted.

use std::fmt;
use std::fmt::Write;

use wirekit_common::{ensure_attach, Result};

use crate::error::JsonError;
use crate::parse::Handler;
use crate::value::Value;

//
// public types
//

/// A [`Handler`] concatenating token fragments into a JSON string.
#[derive(Debug, Default)]
pub struct Writer {
    out: String,
}

//
// Value impls
//

impl Value {
    /// Walks the tree, pushing the same event stream the parser would produce for its text.
    ///
    /// Fails with [`JsonError::Aborted`] when the handler vetoes an event.
    pub fn serialize<H: Handler>(&self, handler: &mut H) -> Result<(), JsonError> {
        accepted(handler.start_document())?;
        self.serialize_value(handler)?;
        accepted(handler.end_document())?;
        Ok(())
    }

    /// The document as compact JSON text.
    pub fn to_json(&self) -> String {
        let mut writer = Writer::default();
        // The writer accepts every event.
        self.serialize(&mut writer).unwrap_or_else(|_| unreachable!());
        writer.into_string()
    }

    fn serialize_value<H: Handler>(&self, handler: &mut H) -> Result<(), JsonError> {
        match self {
            Self::Null => accepted(handler.null()),
            Self::Bool(value) => accepted(handler.boolean(*value)),
            Self::Number(number) => accepted(handler.number(number.as_text())),
            Self::String(string) => accepted(handler.string(string)),
            Self::Array(values) => {
                accepted(handler.start_array())?;
                for (index, value) in values.iter().enumerate() {
                    accepted(handler.start_member(index))?;
                    accepted(handler.start_value())?;
                    value.serialize_value(handler)?;
                    accepted(handler.end_value())?;
                    accepted(handler.end_member())?;
                }
                accepted(handler.end_array(values.len()))
            }
            Self::Object(object) => {
                accepted(handler.start_object())?;
                for (index, (key, value)) in object.iter().enumerate() {
                    accepted(handler.start_member(index))?;
                    accepted(handler.key(key))?;
                    accepted(handler.start_value())?;
                    value.serialize_value(handler)?;
                    accepted(handler.end_value())?;
                    accepted(handler.end_member())?;
                }
                accepted(handler.end_object(object.len()))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

//
// Writer impls
//

impl Writer {
    /// The concatenated output.
    pub fn into_string(self) -> String {
        self.out
    }
}

impl Handler for Writer {
    fn start_member(&mut self, index: usize) -> bool {
        if index > 0 {
            self.out.push(',');
        }
        true
    }

    fn start_array(&mut self) -> bool {
        self.out.push('[');
        true
    }

    fn end_array(&mut self, _count: usize) -> bool {
        self.out.push(']');
        true
    }

    fn start_object(&mut self) -> bool {
        self.out.push('{');
        true
    }

    fn end_object(&mut self, _count: usize) -> bool {
        self.out.push('}');
        true
    }

    fn key(&mut self, key: &str) -> bool {
        self.out.push('"');
        write_escaped(&mut self.out, key);
        self.out.push_str("\":");
        true
    }

    fn string(&mut self, value: &str) -> bool {
        self.out.push('"');
        write_escaped(&mut self.out, value);
        self.out.push('"');
        true
    }

    fn null(&mut self) -> bool {
        self.out.push_str("null");
        true
    }

    fn boolean(&mut self, value: bool) -> bool {
        self.out.push_str(if value { "true" } else { "false" });
        true
    }

    fn number(&mut self, text: &str) -> bool {
        self.out.push_str(text);
        true
    }
}

//
// private functions
//

fn accepted(ok: bool) -> Result<(), JsonError> {
    ensure_attach!(ok, JsonError::Aborted);
    Ok(())
}

fn write_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_round_trip(text: &str) {
        let value = Value::parse(text).unwrap();
        assert_eq!(value.to_json(), text, "serialized form");
        assert_eq!(Value::parse(&value.to_json()).unwrap(), value, "reparse");
    }

    #[test]
    fn compact_forms_round_trip() {
        for text in [
            "[]",
            "{}",
            "[0]",
            "[0,1]",
            "[true]",
            "[false]",
            "[null]",
            "[-123.456e-10]",
            r#"[""]"#,
            r#"["foo"]"#,
            "[[[[]]]]",
            "[{},[],[],[[]],{}]",
            r#"{"key":null}"#,
            r#"{"key":[]}"#,
            r#"{"key":{}}"#,
            r#"{"key":"value"}"#,
            r#"{"key":"value","key2":"value"}"#,
        ] {
            assert_round_trip(text);
        }
    }

    #[test]
    fn whitespace_normalizes() {
        let value = Value::parse("  {\n \"key\"\t: \"value\"\r\n,  \"key2\" : \"value\"\n}\n").unwrap();
        assert_eq!(value.to_json(), r#"{"key":"value","key2":"value"}"#);
    }

    #[test]
    fn rfc4627_example_round_trips() {
        let text = concat!(
            r#"{"Image":{"Width":800,"Height":600,"Title":"View from 15th Floor","#,
            r#""Thumbnail":{"Url":"http://www.example.com/image/481989943","Height":125,"#,
            r#""Width":"100"},"IDs":[116,943,234,38793]}}"#,
        );
        assert_round_trip(text);
    }

    #[test]
    fn object_key_order_preserved() {
        let text = r#"{"zebra":1,"apple":2,"mango":3}"#;
        assert_eq!(Value::parse(text).unwrap().to_json(), text);
    }

    #[test]
    fn number_text_preserved() {
        for text in ["[1.0]", "[10e-1]", "[0.5e+3]", "[-0]"] {
            assert_round_trip(text);
        }
    }

    #[test]
    fn strings_escape_on_output() {
        let value = Value::parse(r#"["a\"b\\c\n"]"#).unwrap();
        assert_eq!(value.to_json(), r#"["a\"b\\c\n"]"#);
    }

    #[test]
    fn solidus_escape_not_reemitted() {
        let value = Value::parse(r#"["a\/b"]"#).unwrap();
        assert_eq!(value.to_json(), r#"["a/b"]"#);
    }

    #[test]
    fn parse_serialize_parse_is_identity() {
        let text = r#"{"a":[1,2.50,{"b":null,"c":[true,false]}],"d":"x\ny"}"#;
        let once = Value::parse(text).unwrap();
        let twice = Value::parse(&once.to_json()).unwrap();
        assert_eq!(once, twice);
    }
}
