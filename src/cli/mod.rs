pub mod chat;

use std::path::PathBuf;

use clap::Args;
use eyre::{Result, WrapErr};
use tracing::{debug, info};
use url::Url;

use crate::openai_client::{OpenAiClient, DEFAULT_BASE_URL};
use crate::parameters::{
    Credential, ModelId, RequestParameters, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use crate::speech::recorder::{AudioRecorder, DEFAULT_RECORDER};
use crate::speech::whisper::{WhisperClient, DEFAULT_TRANSCRIPTION_MODEL};
use crate::speech::{SpeechTranscriber, TranscriptionClient};
use chat::session::SessionController;

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Ask a single question and exit
    #[arg(short, long)]
    pub input: Option<String>,

    /// Model to answer with
    #[arg(short, long, value_enum, default_value_t = ModelId::default())]
    pub model: ModelId,

    /// Sampling temperature (0.0 - 1.0)
    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Maximum tokens in an answer (50 - 300)
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// OpenAI API key; can also be set later with /key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Directory /export writes chat_history.txt into
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,

    /// Recorder program used by /record (SoX `rec` compatible)
    #[arg(long, env = "CHAT_RECORDER", default_value = DEFAULT_RECORDER)]
    pub recorder: String,

    /// Longest utterance /record will capture, in seconds
    #[arg(long, default_value_t = 30)]
    pub max_record_seconds: u32,

    /// Speech-to-text model
    #[arg(long, default_value = DEFAULT_TRANSCRIPTION_MODEL)]
    pub transcription_model: String,

    /// Disable /record
    #[arg(long)]
    pub no_voice: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses a base URL and makes sure relative joins keep its last segment.
pub fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).wrap_err_with(|| format!("invalid base url: {}", raw))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub fn build_session(args: &ChatArgs) -> Result<SessionController> {
    let credential = args.api_key.as_deref().and_then(Credential::new);
    let params =
        RequestParameters::new(args.model, args.temperature, args.max_tokens, credential)?;
    let base_url = normalize_base_url(&args.base_url)?;

    let completion = OpenAiClient::new(&base_url)?;
    debug!("Completion endpoint: {}", completion.endpoint());

    let transcription: Option<Box<dyn TranscriptionClient>> = if args.no_voice {
        info!("Voice input disabled");
        None
    } else {
        let recorder = AudioRecorder::new(args.recorder.clone(), args.max_record_seconds);
        // The key is supplied per capture so /key also reaches speech input.
        let whisper = WhisperClient::new(&base_url, args.transcription_model.clone())?;
        debug!("Transcription endpoint: {}", whisper.endpoint());
        Some(Box::new(SpeechTranscriber::new(recorder, whisper)))
    };

    Ok(SessionController::new(params, Box::new(completion), transcription))
}
