pub const QUESTION_LABEL: &str = "You:";
pub const ANSWER_LABEL: &str = "Assistant:";

/// One question and the assistant's answer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    question: String,
    answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// The turns of the current session, oldest first.
#[derive(Debug, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn all(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Plain-text transcript: "You: q" / "Assistant: a" per turn.
    pub fn serialize(&self) -> String {
        self.turns
            .iter()
            .map(|turn| {
                format!(
                    "{} {}\n{} {}",
                    QUESTION_LABEL, turn.question, ANSWER_LABEL, turn.answer
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
