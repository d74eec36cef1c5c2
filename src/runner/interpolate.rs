//! Variable interpolation for strings
//!
//! This module finds and replaces `@NAME` markers, where `NAME` is a variable
//! identifier. An `@` that is not followed by an uppercase letter is plain text.

use crate::error::{InterpolationError, InterpolationResult};
use regex::Regex;
use std::sync::OnceLock;

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"@[A-Z][A-Z0-9_\-]*").expect("marker pattern is valid"))
}

/// Names referenced by `@NAME` markers, in order of appearance
pub fn markers(s: &str) -> impl Iterator<Item = &str> {
    marker_regex().find_iter(s).map(|m| &m.as_str()[1..])
}

/// Interpolate variables in a string
///
/// Each marker is replaced by whatever `resolve` returns for its name. The
/// first name `resolve` cannot supply aborts the whole substitution.
pub fn interpolate<F>(s: &str, mut resolve: F) -> InterpolationResult<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut result = String::with_capacity(s.len());
    let mut last = 0;

    for found in marker_regex().find_iter(s) {
        let name = &found.as_str()[1..];
        let value =
            resolve(name).ok_or_else(|| InterpolationError::UndefinedVariable(name.to_string()))?;
        result.push_str(&s[last..found.start()]);
        result.push_str(&value);
        last = found.end();
    }

    result.push_str(&s[last..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_interpolation() {
        let vars = vars(&[("NAME", "world")]);
        let result = interpolate("Hello, @NAME!", |n| vars.get(n).cloned()).unwrap();
        assert_eq!(result, "Hello, world!");
    }

    #[test]
    fn test_multiple_variables() {
        let vars = vars(&[("FIRST", "John"), ("LAST", "Doe")]);
        let result = interpolate("@FIRST @LAST", |n| vars.get(n).cloned()).unwrap();
        assert_eq!(result, "John Doe");
    }

    #[test]
    fn test_no_interpolation() {
        let result = interpolate("No variables here", |_| None).unwrap();
        assert_eq!(result, "No variables here");
    }

    #[test]
    fn test_lowercase_after_at_is_literal() {
        let result = interpolate("mail me@example.com", |_| None).unwrap();
        assert_eq!(result, "mail me@example.com");
        assert_eq!(markers("a @ b @x").count(), 0);
    }

    #[test]
    fn test_undefined_variable() {
        let result = interpolate("Hello, @WHO!", |_| None);
        assert_eq!(
            result,
            Err(InterpolationError::UndefinedVariable("WHO".to_string()))
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let vars = vars(&[("A", "@B")]);
        let result = interpolate("@A", |n| vars.get(n).cloned()).unwrap();
        assert_eq!(result, "@B");
    }

    #[test]
    fn test_marker_name_boundaries() {
        let names: Vec<&str> = markers("@OUT_DIR/@FILE.txt @V2-x").collect();
        assert_eq!(names, vec!["OUT_DIR", "FILE", "V2-"]);
    }
}
