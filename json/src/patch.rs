//! JSON Patch (RFC 6902).
//!
//! A patch is applied to a clone of the target and returned only on overall success, so a failed
//! batch leaves the caller's document untouched.

use wirekit_common::{bail_attach, ensure_attach, ensure_matches_attach, Result, ResultExt};

use crate::error::JsonError;
use crate::pointer::{Location, Pointer};
use crate::value::Value;

//
// public functions
//

/// Applies `patch` (an array of operation objects) to a clone of `target`.
pub fn apply(target: &Value, patch: &Value) -> Result<Value, JsonError> {
    ensure_matches_attach!(patch, Value::Array(operations), JsonError::InvalidPatch);
    let mut result = target.clone();
    for operation in operations {
        apply_operation(&mut result, operation)?;
    }
    Ok(result)
}

/// Structural equality with canonical number comparison, as `test` requires.
///
/// Arrays compare order-strict and objects order-insensitive, like [`Value`] equality; numbers
/// compare numerically, so `1`, `1.0` and `10e-1` all test equal.
pub fn test_eq(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Number(lhs), Value::Number(rhs)) => lhs.canonical() == rhs.canonical(),
        (Value::Array(lhs), Value::Array(rhs)) => {
            lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(lhs, rhs)| test_eq(lhs, rhs))
        }
        (Value::Object(lhs), Value::Object(rhs)) => {
            lhs.len() == rhs.len()
                && lhs.iter().all(|(key, value)| rhs.get(key).is_some_and(|other| test_eq(value, other)))
        }
        (lhs, rhs) => lhs == rhs,
    }
}

//
// private functions
//

fn apply_operation(target: &mut Value, operation: &Value) -> Result<(), JsonError> {
    ensure_attach!(operation.is_object(), JsonError::InvalidPatch);
    let op = required_str(operation, "op")?;
    let path = Pointer::parse(required_str(operation, "path")?)?;
    match op {
        "add" => {
            let value = required_value(operation, "value")?;
            add(target, &path, value.clone())
        }
        "remove" => remove(target, &path).map(drop),
        "replace" => {
            let value = required_value(operation, "value")?;
            replace(target, &path, value.clone())
        }
        "move" => {
            let from = Pointer::parse(required_str(operation, "from")?)?;
            ensure_attach!(!from.is_proper_prefix_of(&path), JsonError::RecursiveMove);
            let removed = remove(target, &from)?;
            add(target, &path, removed)
        }
        "copy" => {
            let from = Pointer::parse(required_str(operation, "from")?)?;
            let copied = from.get(target)?.clone();
            add(target, &path, copied)
        }
        "test" => {
            let value = required_value(operation, "value")?;
            let found = path.get(target)?;
            ensure_attach!(test_eq(found, value), JsonError::TestFailed);
            Ok(())
        }
        _ => bail_attach!(JsonError::InvalidPatch),
    }
    .attach_printable(format!("while applying `{op}` operation"))
}

fn required_str<'a>(operation: &'a Value, field: &str) -> Result<&'a str, JsonError> {
    match required_value(operation, field)? {
        Value::String(value) => Ok(value),
        _ => bail_attach!(JsonError::InvalidPatch),
    }
}

fn required_value<'a>(operation: &'a Value, field: &str) -> Result<&'a Value, JsonError> {
    operation
        .as_object()
        .and_then(|object| object.get(field))
        .ok_or_else(|| JsonError::InvalidPatch.into())
}

fn add(target: &mut Value, path: &Pointer, value: Value) -> Result<(), JsonError> {
    match path.locate(target)? {
        Location::Root => {
            *target = value;
            Ok(())
        }
        Location::Member(object, key) => {
            object.insert(key, value);
            Ok(())
        }
        Location::Element(values, index) => {
            values.insert(index, value);
            Ok(())
        }
    }
}

fn remove(target: &mut Value, path: &Pointer) -> Result<Value, JsonError> {
    match path.locate(target)? {
        Location::Root => bail_attach!(JsonError::InvalidPatch, "cannot remove the document root"),
        Location::Member(object, key) => match object.remove(&key) {
            Some(removed) => Ok(removed),
            None => bail_attach!(JsonError::PathNotFound),
        },
        Location::Element(values, index) => {
            ensure_attach!(index < values.len(), JsonError::IndexOutOfRange);
            Ok(values.remove(index))
        }
    }
}

fn replace(target: &mut Value, path: &Pointer, value: Value) -> Result<(), JsonError> {
    match path.locate(target)? {
        Location::Root => {
            *target = value;
            Ok(())
        }
        Location::Member(object, key) => {
            ensure_attach!(object.contains_key(&key), JsonError::PathNotFound);
            object.insert(key, value);
            Ok(())
        }
        Location::Element(values, index) => {
            ensure_attach!(index < values.len(), JsonError::IndexOutOfRange);
            values[index] = value;
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;

    fn check(target: &str, patch: &str, expected: &str) {
        let target = Value::parse(target).unwrap();
        let patch = Value::parse(patch).unwrap();
        let expected = Value::parse(expected).unwrap();
        assert_eq!(apply(&target, &patch).unwrap(), expected);
    }

    fn check_fails(target: &str, patch: &str, error: JsonError) {
        let target = Value::parse(target).unwrap();
        let patch = Value::parse(patch).unwrap();
        assert_matches!(apply(&target, &patch), Err(err) if *err.get_ref() == error);
    }

    // RFC 6902 appendix A.1.
    #[test]
    fn add_object_member() {
        check(
            r#"{"foo":"bar"}"#,
            r#"[{"op":"add","path":"/baz","value":"qux"}]"#,
            r#"{"baz":"qux","foo":"bar"}"#,
        );
    }

    // RFC 6902 appendix A.2.
    #[test]
    fn add_array_element() {
        check(
            r#"{"foo":["bar","baz"]}"#,
            r#"[{"op":"add","path":"/foo/1","value":"qux"}]"#,
            r#"{"foo":["bar","qux","baz"]}"#,
        );
    }

    // RFC 6902 appendix A.3.
    #[test]
    fn remove_object_member() {
        check(
            r#"{"baz":"qux","foo":"bar"}"#,
            r#"[{"op":"remove","path":"/baz"}]"#,
            r#"{"foo":"bar"}"#,
        );
    }

    // RFC 6902 appendix A.4.
    #[test]
    fn remove_array_element() {
        check(
            r#"{"foo":["bar","qux","baz"]}"#,
            r#"[{"op":"remove","path":"/foo/1"}]"#,
            r#"{"foo":["bar","baz"]}"#,
        );
    }

    // RFC 6902 appendix A.5.
    #[test]
    fn replace_value() {
        check(
            r#"{"baz":"qux","foo":"bar"}"#,
            r#"[{"op":"replace","path":"/baz","value":"boo"}]"#,
            r#"{"baz":"boo","foo":"bar"}"#,
        );
    }

    // RFC 6902 appendix A.6.
    #[test]
    fn move_value() {
        check(
            r#"{"foo":{"bar":"baz","waldo":"fred"},"qux":{"corge":"grault"}}"#,
            r#"[{"op":"move","from":"/foo/waldo","path":"/qux/thud"}]"#,
            r#"{"foo":{"bar":"baz"},"qux":{"corge":"grault","thud":"fred"}}"#,
        );
    }

    // RFC 6902 appendix A.7.
    #[test]
    fn move_array_element() {
        check(
            r#"{"foo":["all","grass","cows","eat"]}"#,
            r#"[{"op":"move","from":"/foo/1","path":"/foo/3"}]"#,
            r#"{"foo":["all","cows","eat","grass"]}"#,
        );
    }

    // RFC 6902 appendix A.8.
    #[test]
    fn test_succeeds() {
        check(
            r#"{"baz":"qux","foo":["a",2,"c"]}"#,
            r#"[{"op":"test","path":"/baz","value":"qux"},{"op":"test","path":"/foo/1","value":2}]"#,
            r#"{"baz":"qux","foo":["a",2,"c"]}"#,
        );
    }

    // RFC 6902 appendix A.9.
    #[test]
    fn test_fails() {
        check_fails(
            r#"{"baz":"qux"}"#,
            r#"[{"op":"test","path":"/baz","value":"bar"}]"#,
            JsonError::TestFailed,
        );
    }

    // RFC 6902 appendix A.10.
    #[test]
    fn add_nested_member_object() {
        check(
            r#"{"foo":"bar"}"#,
            r#"[{"op":"add","path":"/child","value":{"grandchild":{}}}]"#,
            r#"{"foo":"bar","child":{"grandchild":{}}}"#,
        );
    }

    // RFC 6902 appendix A.12.
    #[test]
    fn add_to_nonexistent_target_fails() {
        check_fails(
            r#"{"foo":"bar"}"#,
            r#"[{"op":"add","path":"/baz/bat","value":"qux"}]"#,
            JsonError::PathNotFound,
        );
    }

    // RFC 6902 appendix A.14: `~` escape ordering.
    #[test]
    fn tilde_escapes_evaluate() {
        check(
            r#"{"/":9,"~1":10}"#,
            r#"[{"op":"test","path":"/~01","value":10}]"#,
            r#"{"/":9,"~1":10}"#,
        );
    }

    // RFC 6902 appendix A.15: `/~01` names the key `~1`, whose value is the number 10, not the
    // string "10".
    #[test]
    fn string_number_comparison_fails() {
        check_fails(
            r#"{"/":9,"~1":10}"#,
            r#"[{"op":"test","path":"/~01","value":"10"}]"#,
            JsonError::TestFailed,
        );
    }

    // RFC 6902 appendix A.16.
    #[test]
    fn add_appends_with_dash() {
        check(
            r#"{"foo":["bar"]}"#,
            r#"[{"op":"add","path":"/foo/-","value":["abc","def"]}]"#,
            r#"{"foo":["bar",["abc","def"]]}"#,
        );
    }

    #[test]
    fn add_at_root_replaces_document() {
        check("[1]", r#"[{"op":"add","path":"","value":{"a":1}}]"#, r#"{"a":1}"#);
    }

    #[test]
    fn copy_deep_clones() {
        check(
            r#"{"a":{"b":[1]}}"#,
            r#"[{"op":"copy","from":"/a","path":"/c"},{"op":"add","path":"/c/b/-","value":2}]"#,
            r#"{"a":{"b":[1]},"c":{"b":[1,2]}}"#,
        );
    }

    #[test]
    fn numbers_test_numerically() {
        check(
            "[1]",
            r#"[{"op":"test","path":"/0","value":1.0},{"op":"test","path":"/0","value":10e-1}]"#,
            "[1]",
        );
        check_fails("[1]", r#"[{"op":"test","path":"/0","value":2}]"#, JsonError::TestFailed);
    }

    #[test]
    fn move_into_own_child_rejected() {
        check_fails(
            r#"{"a":{"b":1}}"#,
            r#"[{"op":"move","from":"/a","path":"/a/b/c"}]"#,
            JsonError::RecursiveMove,
        );
    }

    #[test]
    fn operations_apply_in_order() {
        check(
            r#"{"n":1}"#,
            r#"[{"op":"replace","path":"/n","value":2},{"op":"test","path":"/n","value":2},{"op":"remove","path":"/n"}]"#,
            "{}",
        );
    }

    #[test]
    fn failed_batch_leaves_target_untouched() {
        let target = Value::parse(r#"{"a":1}"#).unwrap();
        let patch = Value::parse(
            r#"[{"op":"add","path":"/b","value":2},{"op":"test","path":"/a","value":99}]"#,
        )
        .unwrap();
        assert!(apply(&target, &patch).is_err());
        assert_eq!(target, Value::parse(r#"{"a":1}"#).unwrap());
    }

    #[test]
    fn remove_missing_member_fails() {
        check_fails(r#"{"a":1}"#, r#"[{"op":"remove","path":"/b"}]"#, JsonError::PathNotFound);
    }

    #[test]
    fn replace_missing_member_fails() {
        check_fails(
            r#"{"a":1}"#,
            r#"[{"op":"replace","path":"/b","value":1}]"#,
            JsonError::PathNotFound,
        );
    }

    #[test]
    fn unknown_op_rejected() {
        check_fails(r#"{}"#, r#"[{"op":"frobnicate","path":"/a"}]"#, JsonError::InvalidPatch);
    }

    #[test]
    fn non_array_patch_rejected() {
        check_fails("{}", r#"{"op":"add"}"#, JsonError::InvalidPatch);
    }

    #[test]
    fn add_index_beyond_end_fails() {
        check_fails(
            r#"{"foo":["bar"]}"#,
            r#"[{"op":"add","path":"/foo/5","value":"x"}]"#,
            JsonError::IndexOutOfRange,
        );
    }
}
