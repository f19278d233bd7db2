//! Streaming client for the Google Generative Language API

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use super::{Chunk, ChunkStream, TokenUsage, UpstreamClient, UpstreamError};

/// Client for `models/{model}:streamGenerateContent` with SSE framing
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl UpstreamClient for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str) -> Result<ChunkStream, UpstreamError> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut bytes = response.bytes_stream();

        let stream = async_stream::try_stream! {
            let mut lines = SseLineBuffer::new();
            while let Some(part) = bytes.next().await {
                let part = part?;
                lines.extend(&part);
                while let Some(line) = lines.next_line() {
                    if let Some(chunk) = parse_sse_line(&line)? {
                        yield chunk;
                    }
                }
            }
            // Flush any unterminated trailing line
            if let Some(line) = lines.take_remainder() {
                if let Some(chunk) = parse_sse_line(&line)? {
                    yield chunk;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Parse one SSE line into a chunk.
///
/// Non-data lines (blank separators, comments, `event:` fields) and the
/// `[DONE]` sentinel some backends append are skipped, not errors.
fn parse_sse_line(line: &str) -> Result<Option<Chunk>, UpstreamError> {
    let data = match line.strip_prefix("data:") {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => return Ok(None),
    };

    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let response: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| UpstreamError::Decode(format!("{e}: {data}")))?;

    Ok(Some(response.into_chunk()))
}

/// Buffers raw bytes until complete lines are available.
///
/// SSE frames can be split across network reads, including in the middle
/// of a multi-byte character, so splitting happens on raw bytes.
struct SseLineBuffer {
    buf: Vec<u8>,
}

impl SseLineBuffer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=pos).collect();
        let line = &line[..line.len() - 1];
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        Some(String::from_utf8_lossy(line).into_owned())
    }

    fn take_remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

/// Request body for generateContent
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

/// One streamed generateContent response frame
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GenerateContentResponse {
    fn into_chunk(self) -> Chunk {
        let text = self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        let usage = self.usage_metadata.map(|u| TokenUsage {
            input_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
        });

        Chunk { text, usage }
    }
}
