//! Structural diff over JSON documents.
//!
//! Used by the verifier to report exactly where two folds diverged.
//! The diff walks both values in lockstep and records every path whose
//! value, type, length, or key set differs — the full diff is surfaced,
//! never a truncated summary.

use std::fmt;

use serde_json::Value;

/// One divergent path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// JSON-pointer-like path, e.g. `/phase` or `/placements/1/3`.
    pub path: String,
    /// Rendered left value (`<absent>` when the path is missing).
    pub left: String,
    /// Rendered right value.
    pub right: String,
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} != {}", self.path, self.left, self.right)
    }
}

/// The complete set of divergent paths between two documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuralDiff {
    /// All divergent paths, in traversal order.
    pub entries: Vec<DiffEntry>,
}

impl StructuralDiff {
    /// Returns `true` when the documents were identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of divergent paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for StructuralDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "(no differences)");
        }
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

const ABSENT: &str = "<absent>";

fn render(value: &Value) -> String {
    value.to_string()
}

fn push(entries: &mut Vec<DiffEntry>, path: &str, left: String, right: String) {
    entries.push(DiffEntry {
        path: if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        },
        left,
        right,
    });
}

fn walk(left: &Value, right: &Value, path: &str, entries: &mut Vec<DiffEntry>) {
    match (left, right) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, left_value) in a {
                let child = format!("{path}/{key}");
                match b.get(key) {
                    Some(right_value) => walk(left_value, right_value, &child, entries),
                    None => push(entries, &child, render(left_value), ABSENT.to_string()),
                }
            }
            for (key, right_value) in b {
                if !a.contains_key(key) {
                    let child = format!("{path}/{key}");
                    push(entries, &child, ABSENT.to_string(), render(right_value));
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for (i, (left_value, right_value)) in a.iter().zip(b.iter()).enumerate() {
                walk(left_value, right_value, &format!("{path}/{i}"), entries);
            }
            for (i, left_value) in a.iter().enumerate().skip(b.len()) {
                push(
                    entries,
                    &format!("{path}/{i}"),
                    render(left_value),
                    ABSENT.to_string(),
                );
            }
            for (i, right_value) in b.iter().enumerate().skip(a.len()) {
                push(
                    entries,
                    &format!("{path}/{i}"),
                    ABSENT.to_string(),
                    render(right_value),
                );
            }
        }
        (a, b) => {
            if a != b {
                push(entries, path, render(a), render(b));
            }
        }
    }
}

/// Computes the full structural diff between two JSON documents.
#[must_use]
pub fn structural_diff(left: &Value, right: &Value) -> StructuralDiff {
    let mut entries = Vec::new();
    walk(left, right, "", &mut entries);
    StructuralDiff { entries }
}

#[cfg(test)]
mod unit_tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_identical_documents_have_empty_diff() {
        let doc = json!({"phase": "MATCH", "turn": 3, "zones": [1, 2, 3]});
        assert!(structural_diff(&doc, &doc).is_empty());
    }

    #[test]
    fn test_changed_value_is_reported_with_path() {
        let left = json!({"phase": "MATCH", "turn": 3});
        let right = json!({"phase": "SCORED", "turn": 3});

        let diff = structural_diff(&left, &right);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.entries[0].path, "/phase");
        assert_eq!(diff.entries[0].left, "\"MATCH\"");
        assert_eq!(diff.entries[0].right, "\"SCORED\"");
    }

    #[test]
    fn test_missing_and_extra_keys() {
        let left = json!({"a": 1, "b": 2});
        let right = json!({"b": 2, "c": 3});

        let diff = structural_diff(&left, &right);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.entries[0].path, "/a");
        assert_eq!(diff.entries[0].right, "<absent>");
        assert_eq!(diff.entries[1].path, "/c");
        assert_eq!(diff.entries[1].left, "<absent>");
    }

    #[test]
    fn test_nested_and_array_paths() {
        let left = json!({"placements": {"1": {"3": "hero-a"}}, "tally": ["P1", "P2"]});
        let right = json!({"placements": {"1": {"3": "hero-b"}}, "tally": ["P1"]});

        let diff = structural_diff(&left, &right);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff.entries[0].path, "/placements/1/3");
        assert_eq!(diff.entries[1].path, "/tally/1");
    }

    #[test]
    fn test_type_change_is_one_entry() {
        let left = json!({"winner": null});
        let right = json!({"winner": 1});

        let diff = structural_diff(&left, &right);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.entries[0].path, "/winner");
    }

    #[test]
    fn test_display_renders_every_entry() {
        let left = json!({"a": 1, "b": 2});
        let right = json!({"a": 9, "b": 8});

        let rendered = structural_diff(&left, &right).to_string();
        assert!(rendered.contains("/a: 1 != 9"));
        assert!(rendered.contains("/b: 2 != 8"));
    }
}
