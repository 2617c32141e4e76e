//! Prompt construction
//!
//! Every LLM round-trip renders the same shape: the task instruction,
//! one line per recent message, and a closing cue naming the last speaker.
//!
//! ```text
//! {instruction}
//! {user1}: {content1}
//! ...
//! {lastUser}'s {suffix}
//! ```

pub mod templates;

pub use templates::{template, PromptTask, PromptTemplate};

use crate::error::AssistantError;
use crate::models::Message;
use crate::Result;

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// How the prompt ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closing<'a> {
    /// `{lastUser}'s {suffix}`
    Possessive(&'a str),
    /// A fixed cue such as `Analyzing:`
    Literal(&'a str),
}

#[derive(Debug, Clone)]
pub struct PromptBuilder<'a> {
    instruction: &'a str,
    window: usize,
    line_prefix: &'a str,
    preamble: Vec<String>,
    closing: Closing<'a>,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(instruction: &'a str) -> Self {
        Self {
            instruction,
            window: 5,
            line_prefix: "",
            preamble: Vec::new(),
            closing: Closing::Possessive("response:"),
        }
    }

    /// Builder seeded with a registry template's instruction and window.
    pub fn from_template(template: &'a PromptTemplate) -> Self {
        Self::new(template.instruction).window(template.window)
    }

    pub fn window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    pub fn line_prefix(mut self, prefix: &'a str) -> Self {
        self.line_prefix = prefix;
        self
    }

    /// Extra line rendered between the instruction and the conversation.
    pub fn preamble_line(mut self, line: impl Into<String>) -> Self {
        self.preamble.push(line.into());
        self
    }

    pub fn closing(mut self, closing: Closing<'a>) -> Self {
        self.closing = closing;
        self
    }

    pub fn build(&self, messages: &[Message]) -> Result<String> {
        let last = messages.last().ok_or(AssistantError::EmptyConversation)?;
        let recent = &messages[messages.len().saturating_sub(self.window)..];

        let mut prompt = String::with_capacity(self.instruction.len() + 64 * recent.len());
        prompt.push_str(self.instruction);
        prompt.push('\n');

        for line in &self.preamble {
            prompt.push_str(line);
            prompt.push('\n');
        }

        for message in recent {
            prompt.push_str(self.line_prefix);
            prompt.push_str(&normalize_whitespace(&message.user));
            prompt.push_str(": ");
            prompt.push_str(&normalize_whitespace(&message.content));
            prompt.push('\n');
        }

        match self.closing {
            Closing::Possessive(suffix) => {
                prompt.push_str(&normalize_whitespace(&last.user));
                prompt.push_str("'s ");
                prompt.push_str(suffix);
            }
            Closing::Literal(cue) => prompt.push_str(cue),
        }

        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Vec<Message> {
        vec![
            Message::new("Lan", "Ready for a party?"),
            Message::new("Minh", "Yes,   I am\n ready."),
            Message::new(" Minh ", "Chuyển  Nam\t300k"),
        ]
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n b\t\tc  "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_build_possessive() {
        let prompt = PromptBuilder::new("Detect intent.")
            .window(2)
            .closing(Closing::Possessive("intention:"))
            .build(&conversation())
            .unwrap();

        assert_eq!(
            prompt,
            "Detect intent.\nMinh: Yes, I am ready.\nMinh: Chuyển Nam 300k\nMinh's intention:"
        );
    }

    #[test]
    fn test_build_literal_with_prefix_and_preamble() {
        let prompt = PromptBuilder::new("Script.")
            .line_prefix("- ")
            .preamble_line("System: premium")
            .closing(Closing::Literal("Analyzing:"))
            .build(&conversation())
            .unwrap();

        assert!(prompt.starts_with("Script.\nSystem: premium\n- Lan: Ready for a party?\n"));
        assert!(prompt.ends_with("- Minh: Chuyển Nam 300k\nAnalyzing:"));
    }

    #[test]
    fn test_empty_conversation_is_rejected() {
        let result = PromptBuilder::new("x").build(&[]);
        assert!(matches!(result, Err(AssistantError::EmptyConversation)));
    }

    #[test]
    fn test_window_keeps_most_recent() {
        let messages: Vec<Message> = (0..20)
            .map(|i| Message::new("Minh", format!("message {}", i)))
            .collect();
        let prompt = PromptBuilder::new("x").window(3).build(&messages).unwrap();
        assert!(!prompt.contains("message 16"));
        assert!(prompt.contains("message 17"));
        assert!(prompt.contains("message 19"));
    }
}
