//! Input normalization.
//!
//! Every inbound value is reduced to a trimmed, non-empty string or a tagged
//! [`InputError`]. Nothing here panics, whatever JSON the caller sends.

use serde_json::Value;

use crate::types::{Message, Role};

/// Why an input was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("required")]
    Required,

    #[error("must be a string")]
    NotAString,

    #[error("cannot be empty")]
    Empty,

    #[error("must be an array")]
    NotAnArray,

    #[error("invalid message")]
    InvalidMessage,

    #[error("no user message")]
    NoUserMessage,
}

/// Result of normalizing user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(String),
    Invalid(InputError),
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    /// The normalized text, if valid.
    pub fn text(&self) -> Option<&str> {
        match self {
            Validation::Valid(text) => Some(text),
            Validation::Invalid(_) => None,
        }
    }

    pub fn into_result(self) -> Result<String, InputError> {
        match self {
            Validation::Valid(text) => Ok(text),
            Validation::Invalid(e) => Err(e),
        }
    }
}

/// Normalize a raw JSON value claimed to be user text.
///
/// `None` stands for an absent field; `Some(Value::Null)` for an explicit null.
pub fn validate_value(value: Option<&Value>) -> Validation {
    match value {
        None | Some(Value::Null) => Validation::Invalid(InputError::Required),
        Some(Value::String(s)) => validate_text(s),
        Some(_) => Validation::Invalid(InputError::NotAString),
    }
}

/// Normalize a string: trim it and reject it if nothing is left.
pub fn validate_text(text: &str) -> Validation {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Validation::Invalid(InputError::Empty)
    } else {
        Validation::Valid(trimmed.to_string())
    }
}

/// Parse a conversation (`[{role, content}, ...]`) into typed messages.
pub fn parse_conversation(value: Option<&Value>) -> Result<Vec<Message>, InputError> {
    let items = match value {
        None | Some(Value::Null) => return Err(InputError::Required),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(InputError::NotAnArray),
    };
    if items.is_empty() {
        return Err(InputError::Empty);
    }

    items
        .iter()
        .map(|item| {
            let role = item
                .get("role")
                .and_then(|v| v.as_str())
                .and_then(Role::parse)
                .ok_or(InputError::InvalidMessage)?;
            let content = item
                .get("content")
                .and_then(|v| v.as_str())
                .ok_or(InputError::InvalidMessage)?;
            Ok(Message {
                role,
                content: content.to_string(),
            })
        })
        .collect()
}

/// Validate a conversation and normalize its last user message.
pub fn validate_conversation(value: Option<&Value>) -> Validation {
    let messages = match parse_conversation(value) {
        Ok(messages) => messages,
        Err(e) => return Validation::Invalid(e),
    };
    match crate::types::last_user_message(&messages) {
        Some(last) => validate_text(&last.content),
        None => Validation::Invalid(InputError::NoUserMessage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_and_null_are_required() {
        assert_eq!(validate_value(None), Validation::Invalid(InputError::Required));
        assert_eq!(
            validate_value(Some(&Value::Null)),
            Validation::Invalid(InputError::Required)
        );
    }

    #[test]
    fn test_non_strings_rejected() {
        for value in [json!(42), json!({"text": "hi"}), json!(["hi"]), json!(true)] {
            assert_eq!(
                validate_value(Some(&value)),
                Validation::Invalid(InputError::NotAString),
                "value {value} should be rejected"
            );
        }
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert_eq!(validate_text("   "), Validation::Invalid(InputError::Empty));
        assert_eq!(validate_text("\n\t "), Validation::Invalid(InputError::Empty));
        assert_eq!(validate_text(""), Validation::Invalid(InputError::Empty));
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        let v = validate_value(Some(&json!("  hello there \n")));
        assert!(v.is_valid());
        assert_eq!(v.text(), Some("hello there"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(InputError::Required.to_string(), "required");
        assert_eq!(InputError::NotAString.to_string(), "must be a string");
        assert_eq!(InputError::Empty.to_string(), "cannot be empty");
    }

    #[test]
    fn test_conversation_uses_last_user_message() {
        let conv = json!([
            {"role": "user", "content": "first"},
            {"role": "assistant", "content": "ok"},
            {"role": "user", "content": "  second  "},
        ]);
        assert_eq!(validate_conversation(Some(&conv)).text(), Some("second"));
    }

    #[test]
    fn test_conversation_skips_trailing_assistant() {
        let conv = json!([
            {"role": "user", "content": "help me"},
            {"role": "assistant", "content": ""},
        ]);
        assert_eq!(validate_conversation(Some(&conv)).text(), Some("help me"));
    }

    #[test]
    fn test_conversation_rejections() {
        assert_eq!(validate_conversation(None), Validation::Invalid(InputError::Required));
        assert_eq!(
            validate_conversation(Some(&json!("hi"))),
            Validation::Invalid(InputError::NotAnArray)
        );
        assert_eq!(
            validate_conversation(Some(&json!([]))),
            Validation::Invalid(InputError::Empty)
        );
        assert_eq!(
            validate_conversation(Some(&json!([{"role": "user"}]))),
            Validation::Invalid(InputError::InvalidMessage)
        );
        assert_eq!(
            validate_conversation(Some(&json!([{"role": "", "content": "x"}]))),
            Validation::Invalid(InputError::InvalidMessage)
        );
        assert_eq!(
            validate_conversation(Some(&json!([{"role": "system", "content": "x"}]))),
            Validation::Invalid(InputError::NoUserMessage)
        );
        assert_eq!(
            validate_conversation(Some(&json!([{"role": "user", "content": "  "}]))),
            Validation::Invalid(InputError::Empty)
        );
    }

    #[test]
    fn test_empty_content_allowed_in_history() {
        let conv = json!([{"role": "assistant", "content": ""}, {"role": "user", "content": "hi"}]);
        let messages = parse_conversation(Some(&conv)).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "");
    }
}
