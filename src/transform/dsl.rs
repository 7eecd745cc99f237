//! Template evaluation.
//!
//! A template is a JSON object whose values are rewritten against a source
//! document:
//!
//! | Template value                   | Output                                   |
//! |----------------------------------|------------------------------------------|
//! | `"@ctx.a.b"`                     | value at `a.b` in the context map, or null |
//! | `"$."`                           | the current scope verbatim               |
//! | `"$.a.b"`                        | JSONPath lookup in the current scope, or null |
//! | `{"json.path": "$.x", ...rest}`  | `rest` applied to every element of `$.x` |
//! | object / array                   | processed recursively                    |
//! | anything else                    | copied as is                             |

use serde_json::{Map, Value};
use thiserror::Error;

use crate::routing::Template;
use crate::transform::path::{JsonPath, PathError};

const ARRAY_DIRECTIVE: &str = "json.path";
const CONTEXT_PREFIX: &str = "@ctx.";
const SCOPE_PATH: &str = "$.";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("source is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error("array path {0} did not resolve")]
    MissingArray(String),

    #[error("array path {0} does not point to an array")]
    NotAnArray(String),

    #[error("failed to serialize result: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Rewrite `data` through `template` without a context map.
pub fn transform(data: &[u8], template: &Template) -> Result<Vec<u8>, TemplateError> {
    transform_with_context(data, template, None)
}

/// Rewrite `data` through `template`; `@ctx.` lookups read `context`.
///
/// An empty template returns `data` unchanged, even if it is not JSON.
pub fn transform_with_context(
    data: &[u8],
    template: &Template,
    context: Option<&Map<String, Value>>,
) -> Result<Vec<u8>, TemplateError> {
    if template.is_empty() {
        return Ok(data.to_vec());
    }

    let source: Value = serde_json::from_slice(data).map_err(TemplateError::InvalidJson)?;
    let result = transform_value(&source, template, context)?;
    serde_json::to_vec(&result).map_err(TemplateError::Serialize)
}

/// Apply `template` to an already parsed source document.
pub fn transform_value(
    source: &Value,
    template: &Template,
    context: Option<&Map<String, Value>>,
) -> Result<Value, TemplateError> {
    process_object(source, template, context).map(Value::Object)
}

fn process_object(
    scope: &Value,
    template: &Template,
    context: Option<&Map<String, Value>>,
) -> Result<Map<String, Value>, TemplateError> {
    template
        .iter()
        .map(|(key, value)| Ok((key.clone(), process_value(scope, value, context)?)))
        .collect()
}

fn process_value(
    scope: &Value,
    value: &Value,
    context: Option<&Map<String, Value>>,
) -> Result<Value, TemplateError> {
    match value {
        Value::String(text) => Ok(process_string(scope, text, context)),
        Value::Object(map) => match map.get(ARRAY_DIRECTIVE) {
            Some(Value::String(path)) => process_array(scope, path, map, context),
            _ => process_object(scope, map, context).map(Value::Object),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| process_value(scope, item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

fn process_string(scope: &Value, text: &str, context: Option<&Map<String, Value>>) -> Value {
    if let Some(ctx_path) = text.strip_prefix(CONTEXT_PREFIX) {
        return context
            .and_then(|ctx| context_lookup(ctx, ctx_path))
            .cloned()
            .unwrap_or(Value::Null);
    }
    if text == SCOPE_PATH {
        return scope.clone();
    }
    if !text.starts_with(SCOPE_PATH) {
        return Value::String(text.to_string());
    }

    match JsonPath::parse(text) {
        Ok(path) => path.lookup(scope).unwrap_or(Value::Null),
        Err(e) => {
            tracing::debug!(path = %text, error = %e, "Unparseable template path, emitting null");
            Value::Null
        }
    }
}

fn context_lookup<'a>(context: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut keys = path.split('.');
    let mut current = context.get(keys.next()?)?;
    for key in keys {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

fn process_array(
    scope: &Value,
    path: &str,
    directive: &Template,
    context: Option<&Map<String, Value>>,
) -> Result<Value, TemplateError> {
    let target = if path == SCOPE_PATH {
        Some(scope.clone())
    } else {
        JsonPath::parse(path)?.lookup(scope)
    };
    let items = match target {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(TemplateError::NotAnArray(path.to_string())),
        None => return Err(TemplateError::MissingArray(path.to_string())),
    };

    let mut item_template = directive.clone();
    item_template.remove(ARRAY_DIRECTIVE);

    items
        .iter()
        .map(|item| process_object(item, &item_template, context).map(Value::Object))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}
