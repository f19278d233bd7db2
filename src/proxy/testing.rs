//! Test doubles shared by the proxy tests

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::trace::{CallOutcome, CallStart, TraceError, TraceHandle, TraceRecorder};
use crate::upstream::{Chunk, ChunkStream, TokenUsage, UpstreamClient, UpstreamError};

/// Upstream double that replays a scripted chunk sequence once
pub struct MockUpstream {
    script: Mutex<Option<Vec<Result<Chunk, UpstreamError>>>>,
    fail_open: bool,
    pub calls: AtomicUsize,
}

impl MockUpstream {
    pub fn new(script: Vec<Result<Chunk, UpstreamError>>) -> Self {
        Self {
            script: Mutex::new(Some(script)),
            fail_open: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Double whose generate() call itself fails
    pub fn failing_open() -> Self {
        Self {
            script: Mutex::new(None),
            fail_open: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamClient for MockUpstream {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<ChunkStream, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(UpstreamError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let script = self
            .script
            .lock()
            .unwrap()
            .take()
            .expect("mock upstream script consumed twice");
        Ok(stream::iter(script).boxed())
    }
}

/// Convenience constructors for scripted chunks
pub fn text_chunk(text: &str) -> Result<Chunk, UpstreamError> {
    Ok(Chunk {
        text: text.to_string(),
        usage: None,
    })
}

pub fn usage_chunk(text: &str, input: u64, output: u64) -> Result<Chunk, UpstreamError> {
    Ok(Chunk {
        text: text.to_string(),
        usage: Some(TokenUsage {
            input_tokens: input,
            output_tokens: output,
        }),
    })
}

pub fn stream_failure(message: &str) -> Result<Chunk, UpstreamError> {
    Err(UpstreamError::Decode(message.to_string()))
}

/// Recorder double that captures everything it is told
#[derive(Default)]
pub struct RecordingRecorder {
    pub starts: Mutex<Vec<CallStart>>,
    pub events: Mutex<Vec<String>>,
    pub outcomes: Mutex<Vec<CallOutcome>>,
}

impl RecordingRecorder {
    pub fn start_count(&self) -> usize {
        self.starts.lock().unwrap().len()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_outcome(&self) -> Option<CallOutcome> {
        self.outcomes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TraceRecorder for RecordingRecorder {
    async fn start(&self, call: &CallStart) -> Result<TraceHandle, TraceError> {
        self.starts.lock().unwrap().push(call.clone());
        Ok(TraceHandle::new())
    }

    async fn add_event(&self, _handle: &TraceHandle, name: &str) -> Result<(), TraceError> {
        self.events.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn end(&self, _handle: TraceHandle, outcome: CallOutcome) -> Result<(), TraceError> {
        self.outcomes.lock().unwrap().push(outcome);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
