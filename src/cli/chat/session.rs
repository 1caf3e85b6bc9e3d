//! The per-session state machine behind the chat REPL.
//!
//! ```text
//! Idle --start--> AwaitingInput --submit--> Requesting --ok--> Displaying
//!                      ^                        |                  |
//!                      +-------- failure -------+                  |
//!                      +------------- finish_display --------------+
//! ```
//!
//! `clear` is accepted in every state and lands in `AwaitingInput`.

use std::fmt;

use tracing::{debug, info, warn};

use super::conversation_state::{ConversationLog, ConversationTurn};
use crate::error::{ParameterError, SessionError, TranscriptionError};
use crate::openai_client::CompletionClient;
use crate::parameters::{Credential, ModelId, RequestParameters};
use crate::prompt_template::PromptBuilder;
use crate::speech::TranscriptionClient;

pub const EXPORT_FILE_NAME: &str = "chat_history.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingInput,
    Requesting,
    Displaying,
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingInput => "awaiting input",
            SessionState::Requesting => "requesting",
            SessionState::Displaying => "displaying",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A serialized conversation ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: &'static str,
    pub contents: String,
}

pub struct SessionController {
    state: SessionState,
    question: String,
    params: RequestParameters,
    log: ConversationLog,
    prompt_builder: PromptBuilder,
    completion: Box<dyn CompletionClient>,
    transcription: Option<Box<dyn TranscriptionClient>>,
}

impl SessionController {
    pub fn new(
        params: RequestParameters,
        completion: Box<dyn CompletionClient>,
        transcription: Option<Box<dyn TranscriptionClient>>,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            question: String::new(),
            params,
            log: ConversationLog::new(),
            prompt_builder: PromptBuilder,
            completion,
            transcription,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn parameters(&self) -> &RequestParameters {
        &self.params
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn has_transcription(&self) -> bool {
        self.transcription.is_some()
    }

    pub fn start(&mut self) {
        if self.state == SessionState::Idle {
            info!("Session started");
            self.state = SessionState::AwaitingInput;
        }
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    pub fn set_model(&mut self, model: ModelId) {
        self.params.set_model(model);
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), ParameterError> {
        self.params.set_temperature(temperature)
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<(), ParameterError> {
        self.params.set_max_tokens(max_tokens)
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.params.set_credential(credential);
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: &[SessionState],
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state.name(),
            })
        }
    }

    /// Sends the pending question. On success the new turn is returned and
    /// the session is `Displaying` until [`finish_display`] is called.
    ///
    /// [`finish_display`]: SessionController::finish_display
    pub async fn submit(&mut self) -> Result<ConversationTurn, SessionError> {
        self.require("submit", &[SessionState::AwaitingInput])?;

        if self.question.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        if self.params.credential().is_none() {
            warn!("Question submitted without an API key");
            return Err(SessionError::MissingCredential);
        }

        self.state = SessionState::Requesting;
        let prompt = self.prompt_builder.render(&self.question);
        debug!("Requesting completion with model {}", self.params.model());

        match self.completion.complete(&prompt, &self.params).await {
            Ok(answer) => {
                let turn = ConversationTurn::new(std::mem::take(&mut self.question), answer);
                self.log.append(turn.clone());
                self.state = SessionState::Displaying;
                info!("Conversation now has {} turn(s)", self.log.len());
                Ok(turn)
            }
            Err(e) => {
                warn!("Completion failed: {}", e);
                self.state = SessionState::AwaitingInput;
                Err(e.into())
            }
        }
    }

    pub fn finish_display(&mut self) {
        if self.state == SessionState::Displaying {
            self.state = SessionState::AwaitingInput;
        }
    }

    pub fn export(&self) -> Result<ExportArtifact, SessionError> {
        self.require(
            "export",
            &[SessionState::AwaitingInput, SessionState::Displaying],
        )?;
        if self.log.is_empty() {
            return Err(SessionError::NothingToExport);
        }

        Ok(ExportArtifact {
            file_name: EXPORT_FILE_NAME,
            contents: self.log.serialize(),
        })
    }

    pub fn clear(&mut self) {
        info!("Clearing {} turn(s)", self.log.len());
        self.log.clear();
        self.state = SessionState::AwaitingInput;
    }

    /// Records one utterance into the question field. On failure the field
    /// keeps whatever it held before.
    pub async fn transcribe(&mut self) -> Result<&str, SessionError> {
        self.require("record", &[SessionState::AwaitingInput])?;

        let transcription = self.transcription.as_ref().ok_or_else(|| {
            SessionError::Transcription(TranscriptionError::ServiceUnavailable(
                "speech input is not configured".to_string(),
            ))
        })?;

        match transcription
            .capture_utterance(self.params.credential())
            .await
        {
            Ok(text) => {
                debug!("Transcribed {} characters", text.len());
                self.question = text;
                Ok(&self.question)
            }
            Err(e) => {
                warn!("Transcription failed: {}", e);
                Err(e.into())
            }
        }
    }
}
