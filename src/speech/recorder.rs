//! Microphone capture through an external recorder process.
//!
//! The default recorder is SoX's `rec`, configured with a `silence` effect
//! so it stops by itself once the speaker pauses. The recorder holds the
//! input device only while the process is alive.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::TranscriptionError;

pub const DEFAULT_RECORDER: &str = "rec";

/// Size of a canonical WAV header; anything not larger holds no samples.
const WAV_HEADER_LEN: u64 = 44;

static CAPTURE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Records one utterance into a WAV file.
#[derive(Debug, Clone)]
pub struct AudioRecorder {
    program: String,
    max_seconds: u32,
}

/// A finished recording. The file is removed when this is dropped.
#[derive(Debug)]
pub struct Recording {
    path: PathBuf,
}

impl Recording {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn has_samples(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|meta| meta.len() > WAV_HEADER_LEN)
            .unwrap_or(false)
    }

    pub async fn bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

impl Drop for Recording {
    // Drop cannot await, so the removal is a plain blocking call.
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove recording {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Owns the running recorder process; the device is released on drop.
struct DeviceGuard {
    child: Child,
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            debug!("Stopping recorder process");
            let _ = self.child.start_kill();
        }
    }
}

impl AudioRecorder {
    pub fn new(program: impl Into<String>, max_seconds: u32) -> Self {
        Self {
            program: program.into(),
            max_seconds,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for a 16 kHz mono recording that ends after 1.5 s of silence.
    fn args(&self, output: &Path) -> Vec<String> {
        vec![
            "-q".to_string(),
            "-c".to_string(),
            "1".to_string(),
            "-r".to_string(),
            "16000".to_string(),
            "-b".to_string(),
            "16".to_string(),
            output.display().to_string(),
            "silence".to_string(),
            "1".to_string(),
            "0.1".to_string(),
            "3%".to_string(),
            "1".to_string(),
            "1.5".to_string(),
            "3%".to_string(),
            "trim".to_string(),
            "0".to_string(),
            self.max_seconds.to_string(),
        ]
    }

    fn next_output_path() -> PathBuf {
        let seq = CAPTURE_SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "openai-chat-utterance-{}-{}.wav",
            std::process::id(),
            seq
        ))
    }

    /// Blocks until the recorder detects the end of one utterance.
    pub async fn record_utterance(&self) -> Result<Recording, TranscriptionError> {
        let recording = Recording {
            path: Self::next_output_path(),
        };

        debug!("Starting recorder {} -> {}", self.program, recording.path.display());

        let child = Command::new(&self.program)
            .args(self.args(&recording.path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TranscriptionError::DeviceUnavailable(format!(
                    "failed to start {}: {}",
                    self.program, e
                ))
            })?;

        let mut guard = DeviceGuard { child };
        let status = guard
            .child
            .wait()
            .await
            .map_err(|e| TranscriptionError::DeviceUnavailable(e.to_string()))?;

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = guard.child.stderr.take() {
                use tokio::io::AsyncReadExt;
                let _ = pipe.read_to_string(&mut stderr).await;
            }
            return Err(TranscriptionError::DeviceUnavailable(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                stderr.trim()
            )));
        }

        Ok(recording)
    }
}
