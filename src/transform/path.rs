//! JSONPath lookups over `serde_json_path` (RFC 9535).
//!
//! A singular path (names and indexes only) resolves to one value or
//! nothing. A path that can select many nodes (wildcards, slices, unions,
//! filters, descendants) always resolves to an array of the matches, empty
//! included.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid JSONPath {path:?}: {source}")]
pub struct PathError {
    pub path: String,
    #[source]
    pub source: serde_json_path::ParseError,
}

/// A parsed path expression.
#[derive(Debug)]
pub struct JsonPath {
    query: serde_json_path::JsonPath,
    fans_out: bool,
}

impl JsonPath {
    pub fn parse(expr: &str) -> Result<Self, PathError> {
        let query = serde_json_path::JsonPath::parse(expr).map_err(|source| PathError {
            path: expr.to_string(),
            source,
        })?;
        Ok(Self {
            query,
            fans_out: selects_many(expr),
        })
    }

    /// Evaluate against `root`. Returns `None` when a singular path does not
    /// resolve.
    pub fn lookup(&self, root: &Value) -> Option<Value> {
        let nodes = self.query.query(root).all();
        if self.fans_out {
            Some(Value::Array(nodes.into_iter().cloned().collect()))
        } else {
            nodes.into_iter().next().cloned()
        }
    }
}

/// True when `expr` contains a selector outside quoted names that can yield
/// more than one node. Only called on expressions that already parsed.
fn selects_many(expr: &str) -> bool {
    let mut quote = None;
    let mut chars = expr.chars().peekable();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(_), '\\') => {
                chars.next();
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '*' | ':' | '?' | ',') => return true,
            (None, '.') if chars.peek() == Some(&'.') => return true,
            (None, _) => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lookup(expr: &str, doc: &Value) -> Option<Value> {
        JsonPath::parse(expr).unwrap().lookup(doc)
    }

    #[test]
    fn test_member_and_index_steps() {
        let doc = json!({"a": {"b": [10, 20, 30]}, "x.y": 1});
        assert_eq!(lookup("$.a.b[1]", &doc), Some(json!(20)));
        assert_eq!(lookup("$.a.b[-1]", &doc), Some(json!(30)));
        assert_eq!(lookup("$['a'][\"b\"][0]", &doc), Some(json!(10)));
        assert_eq!(lookup("$['x.y']", &doc), Some(json!(1)));
        assert_eq!(lookup("$", &doc), Some(doc.clone()));
    }

    #[test]
    fn test_quoted_names_with_selector_characters() {
        let doc = json!({"a]b": 1, "x:y": 2, "it's": 3, "p*q,r": 4});
        assert_eq!(lookup("$['a]b']", &doc), Some(json!(1)));
        assert_eq!(lookup("$['x:y']", &doc), Some(json!(2)));
        assert_eq!(lookup(r"$['it\'s']", &doc), Some(json!(3)));
        assert_eq!(lookup(r#"$["p*q,r"]"#, &doc), Some(json!(4)));
    }

    #[test]
    fn test_failed_lookups() {
        let doc = json!({"a": {"b": [10]}, "s": "text"});
        assert_eq!(lookup("$.missing", &doc), None);
        assert_eq!(lookup("$.a.b[3]", &doc), None);
        assert_eq!(lookup("$.s.inner", &doc), None);
        assert_eq!(lookup("$.a[0]", &doc), None);
        assert_eq!(lookup("$.s[*]", &doc), Some(json!([])));
    }

    #[test]
    fn test_null_value_resolves() {
        let doc = json!({"a": null});
        assert_eq!(lookup("$.a", &doc), Some(Value::Null));
    }

    #[test]
    fn test_wildcards_slices_and_descendants() {
        let doc = json!({"items": [{"id": 1}, {"id": 2}, {"name": "no id"}, {"id": 4}]});
        assert_eq!(lookup("$.items[*].id", &doc), Some(json!([1, 2, 4])));
        assert_eq!(lookup("$.items.*.id", &doc), Some(json!([1, 2, 4])));
        assert_eq!(lookup("$.items[1:3]", &doc), Some(json!([{"id": 2}, {"name": "no id"}])));
        assert_eq!(lookup("$.items[:-3]", &doc), Some(json!([{"id": 1}])));
        assert_eq!(lookup("$.items[5:]", &doc), Some(json!([])));
        assert_eq!(lookup("$..name", &doc), Some(json!(["no id"])));
        assert_eq!(lookup("$.items[0,3].id", &doc), Some(json!([1, 4])));
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["a.b", "$.", "$[", "$[x]", "$.a[1:y]", "$a"] {
            assert!(JsonPath::parse(bad).is_err(), "{bad} should not parse");
        }
    }
}
