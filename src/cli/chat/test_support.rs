use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::{CompletionError, TranscriptionError};
use crate::openai_client::CompletionClient;
use crate::parameters::{Credential, RequestParameters};
use crate::prompt_template::RenderedPrompt;
use crate::speech::TranscriptionClient;

/// Records every request and answers from a scripted queue ("ok" once empty).
#[derive(Clone, Default)]
pub struct FakeCompletion {
    pub calls: Arc<Mutex<Vec<(RenderedPrompt, RequestParameters)>>>,
    replies: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
}

impl FakeCompletion {
    pub fn replying(replies: Vec<Result<String, CompletionError>>) -> Self {
        let fake = Self::default();
        *fake.replies.lock().unwrap() = replies.into();
        fake
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        params: &RequestParameters,
    ) -> Result<String, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.clone(), params.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// Replays a scripted result, refusing like the real service when no key is given.
pub struct FakeTranscription(pub Result<String, TranscriptionError>);

#[async_trait]
impl TranscriptionClient for FakeTranscription {
    async fn capture_utterance(
        &self,
        credential: Option<&Credential>,
    ) -> Result<String, TranscriptionError> {
        if credential.is_none() {
            return Err(TranscriptionError::ServiceUnavailable(
                "no API key configured for speech recognition".to_string(),
            ));
        }
        self.0.clone()
    }
}

/// A `Write` sink whose contents can be inspected after being boxed.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Accepts one HTTP request, answers it with `body` as JSON and hands back the
/// raw request bytes. Returns the `/v1/` base URL to point a client at.
pub async fn serve_once(body: &'static str) -> (Url, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = Url::parse(&format!("http://{}/v1/", addr)).unwrap();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        while !request_complete(&request) {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            concat!(
                "HTTP/1.1 200 OK\r\n",
                "Content-Type: application/json\r\n",
                "Content-Length: {}\r\n",
                "Connection: close\r\n\r\n{}"
            ),
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        request
    });

    (base, handle)
}

fn request_complete(request: &[u8]) -> bool {
    let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
    let body = &request[header_end + 4..];

    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok());

    match content_length {
        Some(len) => body.len() >= len,
        None => body.ends_with(b"0\r\n\r\n"),
    }
}
