//! Dot-segment removal and reference resolution (RFC 3986 §5).

use std::collections::VecDeque;

use crate::parse::{Path, PathKind, Uri};

//
// Path impls
//

impl Path {
    /// Applies the remove-dot-segments algorithm of §5.2.4.
    ///
    /// Operates directly on the slash-carrying segments: a leading `.`/`..` drops with the next
    /// segment's slash, `/..` pops the last output segment, and a trailing dot segment leaves a
    /// bare `/` so the trailing slash survives.
    pub fn remove_dot_segments(&self) -> Path {
        let mut input: VecDeque<String> = self.segments.iter().cloned().collect();
        let mut output: Vec<String> = Vec::new();
        while let Some(segment) = input.pop_front() {
            let next_has_slash = input.front().is_some_and(|next| next.starts_with('/'));
            if (segment == "." || segment == "..") && next_has_slash {
                // 2.A: a leading "./" or "../" drops, taking the next segment's slash with it.
                if let Some(next) = input.front_mut() {
                    next.remove(0);
                }
            } else if segment == "/." {
                // 2.B: "/./" drops; a trailing "/." becomes "/".
                if !next_has_slash {
                    input.push_front("/".to_owned());
                }
            } else if segment == "/.." {
                // 2.C: "/../" drops and pops the last output segment; a trailing "/.." likewise
                // but leaves "/".
                output.pop();
                if !next_has_slash {
                    input.push_front("/".to_owned());
                }
            } else if (segment == "." || segment == "..") && input.is_empty() {
                // 2.D: a lone "." or ".." at the very end vanishes.
            } else {
                // 2.E: anything else moves to the output.
                output.push(segment);
            }
        }
        Path { segments: output, kind: self.kind }
    }

    /// Merges a relative path with a base path (§5.3, "merge").
    pub fn merge(base: &Path, reference: &Path, base_has_authority: bool) -> Path {
        let mut segments;
        if base_has_authority && base.is_empty() {
            segments = reference.segments.clone();
            if reference.is_absolute() {
                // Already rooted.
            } else if let Some(first) = segments.first_mut() {
                first.insert(0, '/');
            } else {
                segments.push("/".to_owned());
            }
        } else {
            segments = base.segments.clone();
            // All but the last segment of the base are kept; the reference's first segment
            // takes over the dropped segment's slash.
            let mut insert_slash = false;
            if let Some(last) = segments.pop() {
                insert_slash = last.starts_with('/');
            }
            let start = segments.len();
            segments.extend(reference.segments.iter().cloned());
            if insert_slash {
                if let Some(first) = segments.get_mut(start) {
                    first.insert(0, '/');
                }
            }
        }
        Path { segments, kind: PathKind::AbEmpty }
    }
}

//
// Uri impls
//

impl Uri {
    /// Resolves `reference` against `self` per §5.3.
    ///
    /// In strict mode any scheme on the reference makes it absolute; non-strict mode treats a
    /// scheme equal to the base's as undefined, absorbing the historical `http:g` ambiguity.
    pub fn resolve(&self, reference: &Uri, strict: bool) -> Uri {
        let mut target = Uri::default();

        let mut scheme = reference.scheme.as_deref();
        if !strict && scheme.is_some() && scheme == self.scheme.as_deref() {
            scheme = None;
        }

        if let Some(scheme) = scheme {
            target.scheme = Some(scheme.to_owned());
            target.authority = reference.authority.clone();
            target.path = reference.path.remove_dot_segments();
            target.query = reference.query.clone();
        } else {
            if reference.authority.is_some() {
                target.authority = reference.authority.clone();
                target.path = reference.path.remove_dot_segments();
                target.query = reference.query.clone();
            } else {
                if reference.path.is_empty() {
                    target.path = self.path.clone();
                    target.query = reference.query.clone().or_else(|| self.query.clone());
                } else {
                    if reference.path.is_absolute() {
                        target.path = reference.path.remove_dot_segments();
                    } else {
                        let merged =
                            Path::merge(&self.path, &reference.path, self.authority.is_some());
                        target.path = merged.remove_dot_segments();
                    }
                    target.query = reference.query.clone();
                }
                target.authority = self.authority.clone();
            }
            target.scheme = self.scheme.clone();
        }

        target.fragment = reference.fragment.clone();
        target
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rds(path: &str) -> String {
        let uri = Uri::parse(&format!("s://h{path}")).unwrap();
        uri.path.remove_dot_segments().text()
    }

    #[test]
    fn dot_segment_removal() {
        assert_eq!(rds("/a/b/c/./../../g"), "/a/g");
        assert_eq!(rds("/./g"), "/g");
        assert_eq!(rds("/../g"), "/g");
        assert_eq!(rds("/a/b/."), "/a/b/");
        assert_eq!(rds("/a/b/.."), "/a/");
        assert_eq!(rds("/a/.."), "/");
        assert_eq!(rds("/.."), "/");
        assert_eq!(rds("/g"), "/g");
    }

    #[test]
    fn dot_segment_removal_leaves_plain_segments() {
        assert_eq!(rds("/g."), "/g.");
        assert_eq!(rds("/.g"), "/.g");
        assert_eq!(rds("/g.."), "/g..");
        assert_eq!(rds("/..g"), "/..g");
    }

    // The full table of RFC 3986 §5.4, plus the strict/non-strict `http:g` pair, as exercised
    // by the resolution harness this module replaces.
    #[test]
    fn rfc_reference_resolution_examples() {
        let base = Uri::parse("http://a/b/c/d;p?q").unwrap();
        let cases: &[(&str, &str, bool)] = &[
            // Normal examples.
            ("g:h", "g:h", true),
            ("g", "http://a/b/c/g", true),
            ("./g", "http://a/b/c/g", true),
            ("g/", "http://a/b/c/g/", true),
            ("/g", "http://a/g", true),
            ("//g", "http://g", true),
            ("?y", "http://a/b/c/d;p?y", true),
            ("g?y", "http://a/b/c/g?y", true),
            ("#s", "http://a/b/c/d;p?q#s", true),
            ("g#s", "http://a/b/c/g#s", true),
            ("g?y#s", "http://a/b/c/g?y#s", true),
            (";x", "http://a/b/c/;x", true),
            ("g;x", "http://a/b/c/g;x", true),
            ("g;x?y#s", "http://a/b/c/g;x?y#s", true),
            ("", "http://a/b/c/d;p?q", true),
            (".", "http://a/b/c/", true),
            ("./", "http://a/b/c/", true),
            ("..", "http://a/b/", true),
            ("../", "http://a/b/", true),
            ("../g", "http://a/b/g", true),
            ("../..", "http://a/", true),
            ("../../", "http://a/", true),
            ("../../g", "http://a/g", true),
            // Abnormal examples.
            ("../../../g", "http://a/g", true),
            ("../../../../g", "http://a/g", true),
            ("/./g", "http://a/g", true),
            ("/../g", "http://a/g", true),
            ("g.", "http://a/b/c/g.", true),
            (".g", "http://a/b/c/.g", true),
            ("g..", "http://a/b/c/g..", true),
            ("..g", "http://a/b/c/..g", true),
            ("./../g", "http://a/b/g", true),
            ("./g/.", "http://a/b/c/g/", true),
            ("g/./h", "http://a/b/c/g/h", true),
            ("g/../h", "http://a/b/c/h", true),
            ("g;x=1/./y", "http://a/b/c/g;x=1/y", true),
            ("g;x=1/../y", "http://a/b/c/y", true),
            ("g?y/./x", "http://a/b/c/g?y/./x", true),
            ("g?y/../x", "http://a/b/c/g?y/../x", true),
            ("g#s/./x", "http://a/b/c/g#s/./x", true),
            ("g#s/../x", "http://a/b/c/g#s/../x", true),
            ("http:g", "http:g", true),
            ("http:g", "http://a/b/c/g", false),
        ];
        for &(reference, expected, strict) in cases {
            let parsed = Uri::parse_reference(reference).unwrap();
            assert_eq!(parsed.to_string(), reference, "reference `{reference}` round-trip");
            let resolved = base.resolve(&parsed, strict);
            assert_eq!(resolved.to_string(), expected, "resolve(`{reference}`, strict={strict})");
        }
    }

    #[test]
    fn resolving_empty_reference_yields_base() {
        let base = Uri::parse("http://a/b/c/d;p?q").unwrap();
        let empty = Uri::parse_reference("").unwrap();
        assert_eq!(base.resolve(&empty, true).to_string(), base.to_string());
    }

    #[test]
    fn resolving_base_against_itself_is_identity() {
        let base = Uri::parse("http://a/b/c/d;p?q").unwrap();
        let resolved = base.resolve(&base, true);
        assert_eq!(resolved.to_string(), base.to_string());
    }

    #[test]
    fn merge_against_empty_base_path_with_authority() {
        let base = Uri::parse("http://h?q").unwrap();
        let reference = Uri::parse_reference("g").unwrap();
        assert_eq!(base.resolve(&reference, true).to_string(), "http://h/g");
    }
}
