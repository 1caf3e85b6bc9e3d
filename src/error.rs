//! Error types for the chat session and its collaborators.

use thiserror::Error;

use crate::parameters::{MAX_TOKENS_RANGE, TEMPERATURE_RANGE};

/// Failures reported by a completion provider.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompletionError {
    #[error("authentication failed: {0}")]
    AuthFailure(String),
    #[error("provider error: {0}")]
    ProviderError(String),
    #[error("invalid request parameters: {0}")]
    InvalidParameters(String),
}

/// Failures reported while capturing or recognising an utterance.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranscriptionError {
    #[error("Sorry, I could not understand the audio.")]
    UnintelligibleAudio,
    #[error("Sorry, there was an issue with the speech recognition service: {0}")]
    ServiceUnavailable(String),
    #[error("audio input device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// A user-supplied sampling parameter outside the accepted range.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error(
        "temperature must be between {min} and {max}, got {0}",
        min = TEMPERATURE_RANGE.start(),
        max = TEMPERATURE_RANGE.end()
    )]
    Temperature(f32),
    #[error(
        "max tokens must be between {min} and {max}, got {0}",
        min = MAX_TOKENS_RANGE.start(),
        max = MAX_TOKENS_RANGE.end()
    )]
    MaxTokens(u32),
    #[error("unsupported model: {0}")]
    UnknownModel(String),
}

/// Everything a session operation can surface to the user.
///
/// None of these end the session; the controller is always back in
/// `AwaitingInput` (or unchanged) after one is returned.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("Please enter the OpenAI API key first (/key <secret> or OPENAI_API_KEY).")]
    MissingCredential,
    #[error("Please provide the user input.")]
    EmptyQuestion,
    #[error("There is no conversation to export yet.")]
    NothingToExport,
    #[error("{operation} is not available while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
}

impl SessionError {
    /// Warnings are printed differently from errors in the REPL.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            SessionError::MissingCredential
                | SessionError::EmptyQuestion
                | SessionError::NothingToExport
                | SessionError::Transcription(TranscriptionError::UnintelligibleAudio)
        )
    }
}
