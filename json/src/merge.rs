//! JSON Merge Patch (RFC 7396).

use crate::value::{Object, Value};

/// Applies a merge patch to `target`, returning the merged document.
///
/// An object patch merges member-wise: a `null` member removes the target's key, any other
/// member replaces-by-merge. A non-object patch replaces the target outright.
pub fn merge_patch(target: &Value, patch: &Value) -> Value {
    let Value::Object(patch_members) = patch else {
        return patch.clone();
    };
    let mut merged = match target {
        Value::Object(members) => members.clone(),
        _ => Object::new(),
    };
    for (key, value) in patch_members.iter() {
        if value.is_null() {
            merged.remove(key);
        } else {
            let base = merged.get(key).cloned().unwrap_or(Value::Null);
            merged.insert(key.to_owned(), merge_patch(&base, value));
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod test {
    use super::*;

    fn check(target: &str, patch: &str, expected: &str) {
        let target = Value::parse(target).unwrap();
        let patch = Value::parse(patch).unwrap();
        let expected = Value::parse(expected).unwrap();
        assert_eq!(merge_patch(&target, &patch), expected);
    }

    // The RFC 7396 §1 example.
    #[test]
    fn rfc_introduction_example() {
        check(
            r#"{"a":"b","c":{"d":"e","f":"g"}}"#,
            r#"{"a":"z","c":{"f":null}}"#,
            r#"{"a":"z","c":{"d":"e"}}"#,
        );
    }

    // The RFC 7396 appendix test cases.
    #[test]
    fn rfc_appendix_cases() {
        check(r#"{"a":"b"}"#, r#"{"a":"c"}"#, r#"{"a":"c"}"#);
        check(r#"{"a":"b"}"#, r#"{"b":"c"}"#, r#"{"a":"b","b":"c"}"#);
        check(r#"{"a":"b"}"#, r#"{"a":null}"#, r#"{}"#);
        check(r#"{"a":"b","b":"c"}"#, r#"{"a":null}"#, r#"{"b":"c"}"#);
        check(r#"{"a":["b"]}"#, r#"{"a":"c"}"#, r#"{"a":"c"}"#);
        check(r#"{"a":"c"}"#, r#"{"a":["b"]}"#, r#"{"a":["b"]}"#);
        check(r#"{"a":{"b":"c"}}"#, r#"{"a":{"b":"d","c":null}}"#, r#"{"a":{"b":"d"}}"#);
        check(r#"{"a":[{"b":"c"}]}"#, r#"{"a":[1]}"#, r#"{"a":[1]}"#);
        check(r#"["a","b"]"#, r#"["c","d"]"#, r#"["c","d"]"#);
        check(r#"{"a":"b"}"#, r#"["c"]"#, r#"["c"]"#);
        check(r#"{"a":"foo"}"#, "null", "null");
        check(r#"{"a":"foo"}"#, r#""bar""#, r#""bar""#);
        check(r#"{"e":null}"#, r#"{"a":1}"#, r#"{"e":null,"a":1}"#);
        check(r#"[1,2]"#, r#"{"a":"b","c":null}"#, r#"{"a":"b"}"#);
        check(r#"{}"#, r#"{"a":{"bb":{"ccc":null}}}"#, r#"{"a":{"bb":{}}}"#);
    }

    #[test]
    fn patch_applies_to_a_copy() {
        let target = Value::parse(r#"{"a":"b"}"#).unwrap();
        let _ = merge_patch(&target, &Value::parse(r#"{"a":null}"#).unwrap());
        assert_eq!(target, Value::parse(r#"{"a":"b"}"#).unwrap());
    }
}
