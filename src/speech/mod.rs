pub mod recorder;
pub mod whisper;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::TranscriptionError;
use crate::parameters::Credential;
use recorder::AudioRecorder;
use whisper::WhisperClient;

/// Captures a single spoken question and turns it into text.
///
/// The credential is the session's current key, so a key entered mid-session
/// applies to the next capture.
#[async_trait]
pub trait TranscriptionClient: Send + Sync {
    async fn capture_utterance(
        &self,
        credential: Option<&Credential>,
    ) -> Result<String, TranscriptionError>;
}

/// Microphone recording followed by a cloud speech-to-text call.
pub struct SpeechTranscriber {
    recorder: AudioRecorder,
    whisper: WhisperClient,
}

impl SpeechTranscriber {
    pub fn new(recorder: AudioRecorder, whisper: WhisperClient) -> Self {
        Self { recorder, whisper }
    }
}

#[async_trait]
impl TranscriptionClient for SpeechTranscriber {
    async fn capture_utterance(
        &self,
        credential: Option<&Credential>,
    ) -> Result<String, TranscriptionError> {
        info!("Listening via {}", self.recorder.program());
        let recording = self.recorder.record_utterance().await?;

        debug!("Utterance recorded to {}", recording.path().display());
        if !recording.has_samples().await {
            return Err(TranscriptionError::UnintelligibleAudio);
        }

        let wav = recording
            .bytes()
            .await
            .map_err(|e| TranscriptionError::DeviceUnavailable(e.to_string()))?;

        self.whisper.transcribe(wav, credential).await
    }
}
