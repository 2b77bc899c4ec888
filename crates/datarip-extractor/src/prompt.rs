//! Prompt construction for schema compilation and row extraction

use datarip_domain::ChatMessage;

/// System directive for schema compilation
pub const SCHEMA_SYSTEM_PROMPT: &str = r#"
# Instructions
You are a highly detailed researcher, who is trying to extract information from a large dataset.

You will be provided with high level instructions of what data to extract, and you are responsible
for creating JSON schema definitions for functions to extract the information you need.
"#;

/// System directive for row extraction
pub const EXTRACTION_SYSTEM_PROMPT: &str = "Only provide results you want to extract";

/// Few-shot (instruction, schema) pairs shown before the user's instruction
///
/// The answers use single quotes and Python literals on purpose: models
/// imitate them, and the parser normalizes both.
pub const SCHEMA_FEW_SHOTS: &[(&str, &str)] = &[
    (
        "I need to extract the total population of all countries.",
        "{'properties': {'country': {'title': 'Country', 'type': 'string'}, 'population': {'title': 'Population', 'type': 'integer'}}, 'required': ['country', 'population'], 'title': 'CountryPopulation', 'type': 'object'}",
    ),
    (
        "I need to extract information about users. I want their id, name, signup timestamp and friends. Default name can be John Doe",
        "{'properties': {'id': {'title': 'Id', 'type': 'integer'}, 'name': {'default': 'John Doe', 'title': 'Name', 'type': 'string'}, 'signup_ts': {'default': None, 'format': 'date-time', 'title': 'Signup Ts', 'type': 'string'}, 'friends': {'default': [], 'items': {'type': 'integer'}, 'title': 'Friends', 'type': 'array'}}, 'required': ['id'], 'title': 'User', 'type': 'object'}",
    ),
    (
        "I need to extract information about survey responses, I want to extract a user name, their phone number if present, their satisfaction score, their criticisms. Make sure their satisfaction score is 1<=score<=10",
        "{'properties': {'user_name': {'title': 'User Name', 'type': 'string'}, 'phone_number': {'default': None, 'title': 'Phone Number', 'type': 'string'}, 'satisfaction_score': {'title': 'Satisfaction Score', 'type': 'integer'}, 'criticisms': {'items': {'type': 'string'}, 'title': 'Criticisms', 'type': 'array'}}, 'required': ['user_name', 'satisfaction_score', 'criticisms'], 'title': 'SurveyResponse', 'type': 'object'}",
    ),
];

/// Messages for one schema-compilation request
///
/// System directive, then the few-shot pairs, then the instruction.
pub fn schema_messages(instruction: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2 + SCHEMA_FEW_SHOTS.len() * 2);
    messages.push(ChatMessage::system(SCHEMA_SYSTEM_PROMPT));
    for (question, answer) in SCHEMA_FEW_SHOTS {
        messages.push(ChatMessage::user(*question));
        messages.push(ChatMessage::assistant(*answer));
    }
    messages.push(ChatMessage::user(instruction));
    messages
}

/// Messages for one row-extraction request
pub fn extraction_messages(text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(EXTRACTION_SYSTEM_PROMPT),
        ChatMessage::user(text),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_schema;
    use datarip_domain::Role;

    #[test]
    fn test_schema_messages_layout() {
        let messages = schema_messages("Extract names");
        assert_eq!(messages.len(), 2 + SCHEMA_FEW_SHOTS.len() * 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].role, Role::Assistant);

        let last = messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "Extract names");
    }

    #[test]
    fn test_extraction_messages() {
        let messages = extraction_messages("Alice is 30");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, EXTRACTION_SYSTEM_PROMPT);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Alice is 30");
    }

    #[test]
    fn test_few_shot_answers_parse() {
        for (_, answer) in SCHEMA_FEW_SHOTS {
            let schema = parse_schema(answer).unwrap();
            assert!(!schema.is_empty());
        }
    }
}
