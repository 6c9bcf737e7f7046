//! Change summaries for the operation history
//!
//! Compares the JSON form of a document before and after an update and
//! lists changed fields as `path: old -> new`. Nested objects are walked
//! with dotted paths; arrays are compared by length and content only.

use serde_json::Value;

/// Fields that change on every write and carry no information
const IGNORED_FIELDS: [&str; 1] = ["updated_at"];

/// Summarize changes between two JSON values, `None` if nothing changed
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let mut changes = Vec::new();
    collect_changes(before, after, "", &mut changes);
    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn collect_changes(before: &Value, after: &Value, prefix: &str, changes: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_val) in old {
                if prefix.is_empty() && IGNORED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                let path = join_path(prefix, key);
                match new.get(key) {
                    Some(new_val) => collect_changes(old_val, new_val, &path, changes),
                    None => changes.push(format!("{}: {} -> (removed)", path, format_value(old_val))),
                }
            }
            for (key, new_val) in new {
                if !old.contains_key(key) {
                    let path = join_path(prefix, key);
                    changes.push(format!("{}: (added) -> {}", path, format_value(new_val)));
                }
            }
        }
        _ if before != after => {
            let label = if prefix.is_empty() { "value" } else { prefix };
            changes.push(format!(
                "{}: {} -> {}",
                label,
                format_value(before),
                format_value(after)
            ));
        }
        _ => {}
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > 40 => {
            let short: String = s.chars().take(37).collect();
            format!("\"{}...\"", short)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_changes() {
        let v = json!({"name": "Groceries", "updated_at": "a"});
        let w = json!({"name": "Groceries", "updated_at": "b"});
        assert_eq!(generate_diff(&v, &w), None);
    }

    #[test]
    fn test_changed_added_removed() {
        let before = json!({"name": "Old", "color": "#fff"});
        let after = json!({"name": "New", "icon": "🛒"});
        let diff = generate_diff(&before, &after).unwrap();
        assert!(diff.contains("name: \"Old\" -> \"New\""));
        assert!(diff.contains("color: \"#fff\" -> (removed)"));
        assert!(diff.contains("icon: (added) -> \"🛒\""));
    }

    #[test]
    fn test_nested_paths() {
        let before = json!({"settings": {"theme": "light", "notifications": true}});
        let after = json!({"settings": {"theme": "dark", "notifications": true}});
        assert_eq!(
            generate_diff(&before, &after).unwrap(),
            "settings.theme: \"light\" -> \"dark\""
        );
    }

    #[test]
    fn test_arrays_summarized() {
        let before = json!({"members": [1]});
        let after = json!({"members": [1, 2]});
        assert_eq!(
            generate_diff(&before, &after).unwrap(),
            "members: [1 items] -> [2 items]"
        );
    }

    #[test]
    fn test_long_strings_truncated() {
        let long = "x".repeat(60);
        let diff = generate_diff(&json!({"d": ""}), &json!({"d": long})).unwrap();
        assert!(diff.ends_with("...\""));
    }
}
