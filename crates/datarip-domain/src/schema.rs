//! Field schema module - what the user asked to be extracted
//!
//! A [`Schema`] is produced once by the schema compiler and is immutable
//! afterwards. Property order is the order the compiler emitted them in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors raised while assembling a schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A required name does not appear in the properties mapping
    #[error("Required field '{0}' is not declared in properties")]
    UnknownRequiredField(String),
}

/// Definition of a single extractable field
///
/// Only `type` and `description` are interpreted; every other JSON-schema
/// keyword (`title`, `default`, `items`, `format`, ...) is carried through
/// untouched so the tool descriptor sees exactly what the compiler produced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldSpec {
    /// JSON-schema type, usually a string such as `"integer"`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<Value>,

    /// Human-readable description of the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Remaining JSON-schema keywords
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldSpec {
    /// Create a field with a simple type name
    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            field_type: Some(Value::String(type_name.into())),
            ..Default::default()
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The type as a plain name, when it is a single string
    pub fn type_name(&self) -> Option<&str> {
        self.field_type.as_ref().and_then(Value::as_str)
    }
}

/// Compiled description of the fields to extract
///
/// Invariant: every name in `required` is a key of `properties`.
///
/// # Examples
///
/// ```
/// use datarip_domain::{FieldSpec, Schema};
/// use indexmap::IndexMap;
///
/// let mut properties = IndexMap::new();
/// properties.insert("name".to_string(), FieldSpec::typed("string"));
/// properties.insert("age".to_string(), FieldSpec::typed("integer"));
///
/// let schema = Schema::new(properties, vec!["name".to_string()]).unwrap();
/// assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["name", "age"]);
/// assert!(schema.is_required("name"));
/// assert!(!schema.is_required("age"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema")]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    properties: IndexMap<String, FieldSpec>,
    required: Vec<String>,
}

/// Unchecked wire form of a schema
#[derive(Deserialize)]
struct RawSchema {
    #[serde(default)]
    title: Option<String>,
    properties: IndexMap<String, FieldSpec>,
    #[serde(default)]
    required: Vec<String>,
}

impl TryFrom<RawSchema> for Schema {
    type Error = SchemaError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        Schema::new(raw.properties, raw.required).map(|schema| match raw.title {
            Some(title) => schema.with_title(title),
            None => schema,
        })
    }
}

impl Schema {
    /// Create a schema, checking that every required name is declared
    ///
    /// Duplicate required names are collapsed, keeping the first occurrence.
    pub fn new(
        properties: IndexMap<String, FieldSpec>,
        required: Vec<String>,
    ) -> Result<Self, SchemaError> {
        let mut deduped: Vec<String> = Vec::with_capacity(required.len());
        for name in required {
            if !properties.contains_key(&name) {
                return Err(SchemaError::UnknownRequiredField(name));
            }
            if !deduped.contains(&name) {
                deduped.push(name);
            }
        }

        Ok(Self {
            title: None,
            properties,
            required: deduped,
        })
    }

    /// Attach the schema title emitted by the compiler
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Schema title, if the compiler gave one
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Field definitions in declaration order
    pub fn properties(&self) -> &IndexMap<String, FieldSpec> {
        &self.properties
    }

    /// Required field names
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Whether `name` is a required field
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no fields are declared
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// JSON-schema object used as tool parameters
    pub fn to_parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
        })
    }
}
