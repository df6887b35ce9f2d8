//! The handler that builds a [`Value`] tree from parse events.

use wirekit_common::{ensure_attach, Result};

use crate::error::JsonError;
use crate::number::Number;
use crate::parse::Handler;
use crate::value::{Object, Value};

//
// public types
//

/// A [`Handler`] assembling the event stream into an owned [`Value`].
///
/// Containers under construction live on a stack; a finished container attaches to its parent
/// (or becomes the root). Duplicate object keys are detected here and abort the parse.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<Container>,
    root: Option<Value>,
    error: Option<JsonError>,
}

#[derive(Debug)]
enum Container {
    Array(Vec<Value>),
    Object(Object, Option<String>),
}

//
// TreeBuilder impls
//

impl TreeBuilder {
    /// Construct a new, empty `TreeBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built document.
    pub fn into_value(self) -> Result<Value, JsonError> {
        ensure_attach!(self.stack.is_empty(), JsonError::UnexpectedEnd);
        match self.root {
            Some(value) => Ok(value),
            None => Err(JsonError::UnexpectedEnd.into()),
        }
    }

    /// The specific error behind a veto, if this builder caused one.
    pub fn take_error(&mut self) -> Option<JsonError> {
        self.error.take()
    }

    fn attach(&mut self, value: Value) -> bool {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return false;
                }
                self.root = Some(value);
                true
            }
            Some(Container::Array(values)) => {
                values.push(value);
                true
            }
            Some(Container::Object(object, key)) => match key.take() {
                Some(key) => {
                    object.insert(key, value);
                    true
                }
                None => false,
            },
        }
    }
}

impl Handler for TreeBuilder {
    fn start_array(&mut self) -> bool {
        self.stack.push(Container::Array(Vec::new()));
        true
    }

    fn end_array(&mut self, count: usize) -> bool {
        match self.stack.pop() {
            Some(Container::Array(values)) if values.len() == count => {
                self.attach(Value::Array(values))
            }
            _ => false,
        }
    }

    fn start_object(&mut self) -> bool {
        self.stack.push(Container::Object(Object::new(), None));
        true
    }

    fn key(&mut self, key: &str) -> bool {
        match self.stack.last_mut() {
            Some(Container::Object(object, pending)) => {
                if object.contains_key(key) {
                    self.error = Some(JsonError::DuplicateKey(key.to_owned()));
                    return false;
                }
                *pending = Some(key.to_owned());
                true
            }
            _ => false,
        }
    }

    fn end_object(&mut self, count: usize) -> bool {
        match self.stack.pop() {
            Some(Container::Object(object, None)) if object.len() == count => {
                self.attach(Value::Object(object))
            }
            _ => false,
        }
    }

    fn string(&mut self, value: &str) -> bool {
        self.attach(Value::String(value.to_owned()))
    }

    fn null(&mut self) -> bool {
        self.attach(Value::Null)
    }

    fn boolean(&mut self, value: bool) -> bool {
        self.attach(Value::Bool(value))
    }

    fn number(&mut self, text: &str) -> bool {
        match Number::from_text(text) {
            Ok(number) => self.attach(Value::Number(number)),
            Err(report) => {
                self.error = Some(report.into_inner());
                false
            }
        }
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn duplicate_keys_rejected() {
        let result = Value::parse(r#"{"a":1,"a":2}"#);
        assert_matches!(
            result,
            Err(err) if *err.get_ref() == JsonError::DuplicateKey("a".to_owned())
        );
    }

    #[test]
    fn duplicate_keys_in_nested_object_rejected() {
        let result = Value::parse(r#"[{"x":{"k":1,"k":1}}]"#);
        assert_matches!(
            result,
            Err(err) if *err.get_ref() == JsonError::DuplicateKey("k".to_owned())
        );
    }

    #[test]
    fn builds_nested_structure() {
        let value = Value::parse(r#"{"a":[1,{"b":null}],"c":true}"#).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), ["a", "c"]);
        let array = object.get("a").unwrap().as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[1].as_object().unwrap().get("b"), Some(&Value::Null));
    }
}
