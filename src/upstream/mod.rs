//! Upstream model client capability

mod gemini;

use async_trait::async_trait;
use futures::stream::BoxStream;

pub use gemini::GeminiClient;

/// One incremental fragment of model output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    /// Text fragment, possibly empty
    pub text: String,
    /// Cumulative token usage, present only on some chunks
    pub usage: Option<TokenUsage>,
}

/// Cumulative token counts reported by the upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode upstream chunk: {0}")]
    Decode(String),
}

/// Lazy sequence of chunks; may yield an error at any point
pub type ChunkStream = BoxStream<'static, Result<Chunk, UpstreamError>>;

/// Capability for generating a streamed model response from a prompt
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Open a streaming generation call for the given model and prompt
    async fn generate(&self, model: &str, prompt: &str) -> Result<ChunkStream, UpstreamError>;
}
