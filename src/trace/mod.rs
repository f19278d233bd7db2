//! Best-effort call tracing
//!
//! A trace spans one upstream call: a start record, optional intermediate
//! events, and an end record carrying either the full output with token
//! totals or an error description. Recorder failures are logged and
//! swallowed; they must never affect the response to the caller.

mod langsmith;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::Mutex;
use uuid::Uuid;

pub use langsmith::LangsmithRecorder;

/// Inputs recorded when a call starts
#[derive(Debug, Clone)]
pub struct CallStart {
    /// Fixed run name (e.g., "Gemini Stream Call")
    pub name: String,
    /// The user question sent as the prompt
    pub question: String,
    /// Model identifier the call targets
    pub model: String,
}

/// Final token counts for a successful call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenTotals {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Terminal state of a traced call
#[derive(Debug, Clone)]
pub enum CallOutcome {
    Success {
        output: String,
        totals: TokenTotals,
    },
    Failure {
        message: String,
    },
}

/// Handle for one in-flight trace.
///
/// Intermediate events are buffered on the handle and shipped with the
/// end record, the way LangSmith run patches carry them.
#[derive(Debug)]
pub struct TraceHandle {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    events: Mutex<Vec<TraceEvent>>,
}

#[derive(Debug, Clone)]
pub struct TraceEvent {
    pub name: String,
    pub at: DateTime<Utc>,
}

impl TraceHandle {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn push_event(&self, name: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(TraceEvent {
                name: name.to_string(),
                at: Utc::now(),
            });
        }
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Default for TraceHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Trace transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Trace endpoint returned status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

/// Capability for recording call traces
#[async_trait]
pub trait TraceRecorder: Send + Sync {
    /// Record the start of a call
    async fn start(&self, call: &CallStart) -> Result<TraceHandle, TraceError>;

    /// Record an intermediate event (e.g., first token received)
    async fn add_event(&self, handle: &TraceHandle, name: &str) -> Result<(), TraceError>;

    /// Record the end of a call, success or failure
    async fn end(&self, handle: TraceHandle, outcome: CallOutcome) -> Result<(), TraceError>;

    /// Name of the recorder
    fn name(&self) -> &str;
}

/// Wraps an optional recorder so every failure is logged and swallowed.
///
/// Handlers talk to this adapter only; a broken or absent recorder
/// degrades to no-ops rather than errors.
#[derive(Clone)]
pub struct BestEffortTracer {
    inner: Option<Arc<dyn TraceRecorder>>,
}

impl BestEffortTracer {
    pub fn new(recorder: Arc<dyn TraceRecorder>) -> Self {
        Self {
            inner: Some(recorder),
        }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub async fn start(&self, call: &CallStart) -> Option<TraceHandle> {
        let recorder = self.inner.as_ref()?;
        match recorder.start(call).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(recorder = recorder.name(), error = %e, "Failed to start trace");
                None
            }
        }
    }

    pub async fn add_event(&self, handle: Option<&TraceHandle>, name: &str) {
        let (Some(recorder), Some(handle)) = (self.inner.as_ref(), handle) else {
            return;
        };
        if let Err(e) = recorder.add_event(handle, name).await {
            tracing::warn!(recorder = recorder.name(), error = %e, "Failed to record trace event");
        }
    }

    pub async fn end(&self, handle: Option<TraceHandle>, outcome: CallOutcome) {
        let (Some(recorder), Some(handle)) = (self.inner.as_ref(), handle) else {
            return;
        };
        if let Err(e) = recorder.end(handle, outcome).await {
            tracing::warn!(recorder = recorder.name(), error = %e, "Failed to end trace");
        }
    }
}
