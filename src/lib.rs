//! gemini-gateway: HTTP gateway for streaming Gemini answers
//!
//! Features:
//! - `POST /ask` endpoint that streams model output as server-sent events
//! - Streaming Gemini client with incremental token usage reporting
//! - Best-effort call tracing (LangSmith-compatible run records)
//! - YAML configuration with environment overrides for credentials

pub mod config;
pub mod proxy;
pub mod trace;
pub mod upstream;

pub use config::AppConfig;
pub use proxy::run_server;
pub use upstream::{Chunk, GeminiClient, TokenUsage, UpstreamClient};
