//! Chat input validation and sanitization.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

use crate::error::AppError;

// NOTE: expect() is acceptable for literal patterns compiled once at startup
static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script\s*>").expect("Invalid regex: script block pattern")
});

/// A user message awaiting validation, already trimmed
#[derive(Debug, Clone, Validate)]
pub struct ChatInput<'a> {
    #[validate(length(min = 1), custom(function = "validate_no_script"))]
    pub text: &'a str,
}

impl<'a> ChatInput<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text: text.trim() }
    }

    /// Length in chars, which is what the ceiling is expressed in
    pub fn char_count(&self) -> u64 {
        self.text.chars().count() as u64
    }
}

fn validate_no_script(text: &str) -> Result<(), ValidationError> {
    if SCRIPT_BLOCK.is_match(text) {
        let mut err = ValidationError::new("unsafe_script");
        err.message = Some(Cow::Borrowed("Unsafe script content detected"));
        return Err(err);
    }
    Ok(())
}

/// Validates a chat message against the character ceiling.
pub fn validate_chat_input(text: &str, max_chars: u64) -> Result<(), AppError> {
    let input = ChatInput::new(text);
    input.validate()?;

    let char_count = input.char_count();
    if char_count > max_chars {
        return Err(AppError::Validation(format!(
            "Message too long: {} characters (max {})",
            char_count, max_chars
        )));
    }
    Ok(())
}

/// Escapes characters that could be interpreted as HTML.
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            other => out.push(other),
        }
    }
    out
}

/// Trims then escapes user-supplied text.
pub fn sanitize_input(input: &str) -> String {
    sanitize_html(input.trim())
}
