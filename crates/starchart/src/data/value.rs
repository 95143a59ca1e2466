//! Accessors for the JSON node trees records are stored as.
//!
//! A node is either a bare token (string or number) or an object whose
//! `name` is its first token, `values` its remaining tokens, and whose other
//! keys are child nodes. A key that occurs more than once holds an array.

use glam::DVec2;
use serde_json::Value;

/// Absent → empty, array → its items, anything else → a single item.
pub fn as_array(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

/// A bare string token, or the `name` of a node.
pub fn name_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("name").and_then(Value::as_str),
        _ => None,
    }
}

/// Parse a token as a float. Strings like `.5` and `5.` are accepted.
pub fn get_float(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => parse_float(s).unwrap_or(default),
        _ => default,
    }
}

/// Parse a token as an integer; a fractional token is truncated.
pub fn get_int(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| parse_float(s).map(|f| f as i64))
                .unwrap_or(default)
        }
        _ => default,
    }
}

fn parse_float(s: &str) -> Option<f64> {
    let s = s.trim();
    let mut owned = String::with_capacity(s.len() + 2);
    if s.starts_with('.') {
        owned.push('0');
    }
    owned.push_str(s);
    if s.ends_with('.') {
        owned.push('0');
    }
    owned.parse::<f64>().ok()
}

/// `[name, ...values]` of a node; a bare token yields itself.
pub fn top_level_tokens(value: Option<&Value>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    let mut tokens = Vec::new();
    match value {
        Value::Object(map) => {
            if let Some(name) = map.get("name") {
                tokens.push(token_string(name));
            }
            for v in as_array(map.get("values")) {
                tokens.push(token_string(v));
            }
        }
        other => tokens.push(token_string(other)),
    }
    tokens
}

/// The `index`th entry of a node's `values`.
pub fn value_at(node: &Value, index: usize) -> Option<&Value> {
    match node.get("values")? {
        Value::Array(items) => items.get(index),
        single if index == 0 => Some(single),
        _ => None,
    }
}

/// A point written as `[x, y]` or as a node `{ name: x, values: [y] }`.
pub fn get_point(value: Option<&Value>) -> DVec2 {
    match value {
        Some(Value::Array(items)) => {
            DVec2::new(get_float(items.first(), 0.0), get_float(items.get(1), 0.0))
        }
        Some(node) if node.is_object() => {
            DVec2::new(get_float(node.get("name"), 0.0), get_float(value_at(node, 0), 0.0))
        }
        _ => DVec2::ZERO,
    }
}

fn token_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn floats_accept_loose_decimal_strings() {
        assert_eq!(get_float(Some(&json!(".5")), 0.0), 0.5);
        assert_eq!(get_float(Some(&json!("5.")), 0.0), 5.0);
        assert_eq!(get_float(Some(&json!(12)), 0.0), 12.0);
        assert_eq!(get_float(Some(&json!("abc")), 7.0), 7.0);
        assert_eq!(get_float(None, 1.0), 1.0);
    }

    #[test]
    fn ints_truncate() {
        assert_eq!(get_int(Some(&json!("42")), 0), 42);
        assert_eq!(get_int(Some(&json!("4.9")), 0), 4);
        assert_eq!(get_int(Some(&json!(3.7)), 0), 3);
        assert_eq!(get_int(None, -1), -1);
    }

    #[test]
    fn as_array_flattens() {
        assert!(as_array(None).is_empty());
        assert_eq!(as_array(Some(&json!("a"))).len(), 1);
        assert_eq!(as_array(Some(&json!(["a", "b"]))).len(), 2);
    }

    #[test]
    fn points_from_both_forms() {
        assert_eq!(get_point(Some(&json!(["1", "2"]))), DVec2::new(1.0, 2.0));
        assert_eq!(
            get_point(Some(&json!({ "name": "-300", "values": ["40.5"] }))),
            DVec2::new(-300.0, 40.5)
        );
        assert_eq!(get_point(None), DVec2::ZERO);
    }

    #[test]
    fn tokens_of_node() {
        let node = json!({ "name": "Sol", "values": ["Earth", 3] });
        assert_eq!(top_level_tokens(Some(&node)), vec!["Sol", "Earth", "3"]);
        assert_eq!(top_level_tokens(Some(&json!("Vega"))), vec!["Vega"]);
        assert_eq!(name_of(&node), Some("Sol"));
    }
}
