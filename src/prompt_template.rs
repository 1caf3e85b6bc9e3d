use serde::Serialize;

pub const SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant. Please respond to the user queries.";

const USER_TEMPLATE_PREFIX: &str = "Question: ";

/// The system + user message pair sent for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system_instruction: String,
    pub user_question: String,
}

/// A single chat message in the provider's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl RenderedPrompt {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system",
                content: self.system_instruction.clone(),
            },
            ChatMessage {
                role: "user",
                content: format!("{}{}", USER_TEMPLATE_PREFIX, self.user_question),
            },
        ]
    }
}

/// Renders the fixed two-message template.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn render(&self, question: &str) -> RenderedPrompt {
        RenderedPrompt {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            user_question: question.to_string(),
        }
    }
}
