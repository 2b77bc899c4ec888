//! Parse provider output into schemas and extracted fields
//!
//! Completions are loosely formatted: they may be wrapped in a markdown
//! fence, quoted with single quotes, or use Python literals. Everything is
//! normalized to strict JSON before parsing.

use crate::error::ExtractorError;
use datarip_domain::Schema;
use serde_json::{Map, Value};
use tracing::warn;

/// Parse a schema-compilation completion into a [`Schema`]
///
/// # Examples
///
/// ```
/// use datarip_extractor::parser::parse_schema;
///
/// let schema = parse_schema(
///     "```json\n{'properties': {'name': {'type': 'string', 'default': None}}, 'required': ['name']}\n```"
/// ).unwrap();
/// assert!(schema.is_required("name"));
/// ```
pub fn parse_schema(text: &str) -> Result<Schema, ExtractorError> {
    let normalized = normalize_quotes(extract_object(text));

    let mut value: Value = serde_json::from_str(&normalized).map_err(|e| {
        warn!("Schema completion is not valid JSON: {}", e);
        ExtractorError::SchemaParse(format!("not a valid JSON object: {}", e))
    })?;

    let object = value
        .as_object_mut()
        .ok_or_else(|| ExtractorError::SchemaParse("expected a JSON object".to_string()))?;

    match object.get("properties") {
        Some(Value::Object(_)) => {}
        Some(_) => {
            return Err(ExtractorError::SchemaParse(
                "'properties' must be an object".to_string(),
            ))
        }
        None => {
            return Err(ExtractorError::SchemaParse(
                "missing 'properties'".to_string(),
            ))
        }
    }

    if matches!(object.get("required"), Some(Value::Null)) {
        object.remove("required");
    }
    if !matches!(object.get("title"), None | Some(Value::String(_))) {
        object.remove("title");
    }

    serde_json::from_value(value).map_err(|e| ExtractorError::SchemaParse(e.to_string()))
}

/// Parse the arguments of a forced tool call into an ordered key/value mapping
pub fn parse_tool_arguments(text: &str) -> Result<Map<String, Value>, ExtractorError> {
    let body = extract_object(text);
    if body.is_empty() {
        return Err(ExtractorError::JsonParse(
            "tool call returned no arguments".to_string(),
        ));
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(&normalize_quotes(body))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ExtractorError::JsonParse(format!(
            "tool arguments must be a JSON object, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strip a markdown fence and any prose around the outermost object
fn extract_object(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(start) = body.find("```") {
        let after = &body[start + 3..];
        // Skip the language tag line, if any
        let after = match after.find('\n') {
            Some(newline) if !after[..newline].contains('{') => &after[newline + 1..],
            _ => after.trim_start_matches("json"),
        };
        body = match after.find("```") {
            Some(end) => &after[..end],
            None => after,
        };
        body = body.trim();
    }

    match (body.find('{'), body.rfind('}')) {
        (Some(open), Some(close)) if open < close => &body[open..=close],
        _ => body,
    }
}

/// Rewrite single-quoted strings and Python literals as JSON
///
/// Double-quoted strings pass through untouched, so apostrophes inside
/// them survive. Outside strings, `None`, `True` and `False` become
/// `null`, `true` and `false`.
pub fn normalize_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut delimiter: Option<char> = None;

    while let Some(c) = chars.next() {
        match delimiter {
            Some(d) => match c {
                '\\' => match chars.next() {
                    Some('\'') => out.push('\''),
                    Some(next) => {
                        out.push('\\');
                        out.push(next);
                    }
                    None => out.push('\\'),
                },
                '"' if d == '\'' => out.push_str("\\\""),
                c if c == d => {
                    out.push('"');
                    delimiter = None;
                }
                c => out.push(c),
            },
            None => match c {
                '\'' | '"' => {
                    out.push('"');
                    delimiter = Some(c);
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let mut word = String::from(c);
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            word.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str(match word.as_str() {
                        "None" => "null",
                        "True" => "true",
                        "False" => "false",
                        other => other,
                    });
                }
                c => out.push(c),
            },
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_json_schema() {
        let schema = parse_schema(
            r#"{"properties": {"name": {"type": "string"}, "age": {"type": "integer"}}, "required": ["name"]}"#,
        )
        .unwrap();
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["name", "age"]);
        assert!(schema.is_required("name"));
        assert_eq!(schema.properties()["age"].type_name(), Some("integer"));
    }

    #[test]
    fn test_parse_fenced_single_quoted_schema() {
        let response = "Here you go:\n```json\n{'properties': {'country': {'title': 'Country', 'type': 'string'}}, 'required': ['country'], 'title': 'CountryPopulation', 'type': 'object'}\n```";
        let schema = parse_schema(response).unwrap();
        assert_eq!(schema.title(), Some("CountryPopulation"));
        assert!(schema.is_required("country"));
    }

    #[test]
    fn test_parse_python_literals() {
        let schema = parse_schema(
            "{'properties': {'signup_ts': {'default': None, 'type': 'string'}, 'active': {'default': True, 'type': 'boolean'}}}",
        )
        .unwrap();
        let props = schema.properties();
        assert_eq!(props["signup_ts"].extra["default"], Value::Null);
        assert_eq!(props["active"].extra["default"], json!(true));
        assert!(schema.required().is_empty());
    }

    #[test]
    fn test_literals_inside_strings_untouched() {
        assert_eq!(
            normalize_quotes("{'note': 'None of True'}"),
            r#"{"note": "None of True"}"#
        );
    }

    #[test]
    fn test_apostrophe_in_double_quoted_string() {
        let normalized = normalize_quotes(r#"{"description": "the user's name"}"#);
        let value: Value = serde_json::from_str(&normalized).unwrap();
        assert_eq!(value["description"], "the user's name");
    }

    #[test]
    fn test_double_quote_inside_single_quoted_string() {
        let normalized = normalize_quotes(r#"{'description': 'the "nickname"'}"#);
        let value: Value = serde_json::from_str(&normalized).unwrap();
        assert_eq!(value["description"], r#"the "nickname""#);
    }

    #[test]
    fn test_missing_properties_rejected() {
        let err = parse_schema(r#"{"required": []}"#).unwrap_err();
        assert!(matches!(err, ExtractorError::SchemaParse(_)));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(matches!(
            parse_schema("I cannot help with that").unwrap_err(),
            ExtractorError::SchemaParse(_)
        ));
        assert!(matches!(
            parse_schema(r#"{"properties": ["name"]}"#).unwrap_err(),
            ExtractorError::SchemaParse(_)
        ));
    }

    #[test]
    fn test_unknown_required_rejected() {
        let err = parse_schema(r#"{"properties": {"a": {"type": "string"}}, "required": ["b"]}"#)
            .unwrap_err();
        match err {
            ExtractorError::SchemaParse(msg) => assert!(msg.contains("'b'")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_tool_arguments_keeps_order() {
        let args = parse_tool_arguments(r#"{"zeta": 1, "alpha": "a", "mid": null}"#).unwrap();
        let keys: Vec<&str> = args.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_tool_arguments_rejects_non_object() {
        assert!(parse_tool_arguments("[1, 2]").is_err());
        assert!(parse_tool_arguments("").is_err());
        assert!(parse_tool_arguments("not json").is_err());
    }

    #[test]
    fn test_parse_tool_arguments_single_quotes() {
        let args = parse_tool_arguments("{'name': 'Alice', 'age': 30}").unwrap();
        assert_eq!(args["name"], "Alice");
        assert_eq!(args["age"], 30);
    }
}
