//! The JSON value tree.
//!
//! A [`Value`] owns its children outright; `clone` is a deep, independent copy and there are no
//! back-pointers. Object members keep their first-insertion order.

use std::collections::HashMap;

use wirekit_common::{ensure_attach, ensure_matches_attach, Result};

use crate::builder::TreeBuilder;
use crate::error::JsonError;
use crate::number::Number;
use crate::parse::{Parser, StrSource};

//
// public types
//

/// A JSON value as defined by RFC 8259.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Object),
}

/// An object whose members keep their insertion order.
///
/// Two synchronized structures back it: the ordered key sequence and a map from key to value.
/// Inserting an existing key replaces its value without moving the key; removing updates both.
#[derive(Clone, Debug, Default)]
pub struct Object {
    keys: Vec<String>,
    entries: HashMap<String, Value>,
}

//
// Value impls
//

impl Value {
    /// Parses a complete JSON document.
    pub fn parse(text: &str) -> Result<Self, JsonError> {
        let mut builder = TreeBuilder::new();
        let result = Parser::new(&mut builder).parse(&mut StrSource::new(text));
        match result {
            Ok(()) => builder.into_value(),
            Err(report) => match builder.take_error() {
                Some(error) => Err(error.into()),
                None => Err(report),
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(..))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(..))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(..))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(..))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(..))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(number) => Some(number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(string) => Some(string),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

// Arrays compare order-strict, objects order-insensitive, numbers by their lexical text.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(lhs), Self::Bool(rhs)) => lhs == rhs,
            (Self::Number(lhs), Self::Number(rhs)) => lhs == rhs,
            (Self::String(lhs), Self::String(rhs)) => lhs == rhs,
            (Self::Array(lhs), Self::Array(rhs)) => lhs == rhs,
            (Self::Object(lhs), Self::Object(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

//
// Object impls
//

impl Object {
    /// Construct a new, empty `Object`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.keys.len(), self.entries.len());
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Inserts a member, replacing the value of an existing key without moving it.
    pub fn insert(&mut self, key: String, value: Value) {
        if !self.entries.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.entries.insert(key, value);
    }

    /// Removes a member, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let value = self.entries.remove(key)?;
        let position = self.keys.iter().position(|existing| existing == key);
        if let Some(position) = position {
            self.keys.remove(position);
        }
        debug_assert_eq!(self.keys.len(), self.entries.len());
        Some(value)
    }

    /// The member keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// The members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.keys.iter().map(|key| {
            let value = self.entries.get(key).unwrap_or_else(|| unreachable!());
            (key.as_str(), value)
        })
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl FromIterator<(String, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut object = Self::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

//
// array helpers
//

impl Value {
    /// Appends to an array.
    pub fn array_push(&mut self, value: Value) -> Result<(), JsonError> {
        ensure_matches_attach!(self, Self::Array(values), JsonError::PathNotFound);
        values.push(value);
        Ok(())
    }

    /// Inserts into an array at `index <= len`.
    pub fn array_insert(&mut self, index: usize, value: Value) -> Result<(), JsonError> {
        ensure_matches_attach!(self, Self::Array(values), JsonError::PathNotFound);
        ensure_attach!(index <= values.len(), JsonError::IndexOutOfRange);
        values.insert(index, value);
        Ok(())
    }

    /// Removes from an array at `index < len`, returning the element.
    pub fn array_remove(&mut self, index: usize) -> Result<Value, JsonError> {
        ensure_matches_attach!(self, Self::Array(values), JsonError::PathNotFound);
        ensure_attach!(index < values.len(), JsonError::IndexOutOfRange);
        Ok(values.remove(index))
    }

    /// Replaces an array element at `index < len`.
    pub fn array_set(&mut self, index: usize, value: Value) -> Result<(), JsonError> {
        ensure_matches_attach!(self, Self::Array(values), JsonError::PathNotFound);
        ensure_attach!(index < values.len(), JsonError::IndexOutOfRange);
        values[index] = value;
        Ok(())
    }

    /// A deep copy of `range` of an array.
    pub fn array_slice(&self, range: std::ops::Range<usize>) -> Result<Value, JsonError> {
        ensure_matches_attach!(self, Self::Array(values), JsonError::PathNotFound);
        let end = range.end.min(values.len());
        let start = range.start.min(end);
        Ok(Self::Array(values[start..end].to_vec()))
    }
}
