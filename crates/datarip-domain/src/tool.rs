//! Chat messages and tool descriptors exchanged with the provider

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Fixed directive framing the conversation
    System,
    /// User turn
    User,
    /// Model turn (used for few-shot examples)
    Assistant,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a chat-completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the message
    pub role: Role,

    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Function signature handed to the provider to force structured output
///
/// Derived once per job from the schema and shared by every queue item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Function name the provider must call
    pub name: String,

    /// What the function does
    pub description: String,

    /// JSON-schema object describing the arguments
    pub parameters: Value,
}

impl ToolDescriptor {
    /// Build a descriptor whose parameters are the schema's properties and required set
    ///
    /// # Examples
    ///
    /// ```
    /// use datarip_domain::{FieldSpec, Schema, ToolDescriptor};
    /// use indexmap::IndexMap;
    ///
    /// let mut properties = IndexMap::new();
    /// properties.insert("country".to_string(), FieldSpec::typed("string"));
    /// let schema = Schema::new(properties, vec!["country".to_string()]).unwrap();
    ///
    /// let tool = ToolDescriptor::from_schema(&schema, "extraction_function", "Extract data");
    /// assert_eq!(tool.name, "extraction_function");
    /// assert_eq!(tool.parameters["required"][0], "country");
    /// ```
    pub fn from_schema(
        schema: &Schema,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: schema.to_parameters(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let msg = ChatMessage::system("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hi");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }
}
