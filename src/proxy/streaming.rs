//! Streaming request lifecycle
//!
//! One invocation runs a single pass over the upstream chunk stream:
//! trace start, per-chunk accumulation and emission, then exactly one
//! terminal event. Upstream failures surface in-stream as `[ERROR]`
//! because the 200 response and its headers are already committed by the
//! time chunks arrive.

use futures::{Stream, StreamExt};
use std::sync::Arc;

use super::events::OutboundEvent;
use crate::trace::{BestEffortTracer, CallOutcome, CallStart, TokenTotals};
use crate::upstream::{Chunk, UpstreamClient};

/// Run name recorded on every trace
pub const RUN_NAME: &str = "Gemini Stream Call";

/// Trace event recorded when the first chunk arrives
const FIRST_TOKEN_EVENT: &str = "new_token";

/// Request-scoped accumulator for one proxied call
struct CallTrace {
    output: String,
    totals: TokenTotals,
    first_chunk_seen: bool,
}

impl CallTrace {
    fn new() -> Self {
        Self {
            output: String::new(),
            totals: TokenTotals::default(),
            first_chunk_seen: false,
        }
    }

    /// Fold one chunk into the running state.
    ///
    /// Usage counts are cumulative on the wire, so they overwrite the
    /// running totals rather than summing. Returns true for the first
    /// chunk of the call.
    fn observe(&mut self, chunk: &Chunk) -> bool {
        let first = !self.first_chunk_seen;
        self.first_chunk_seen = true;

        if let Some(usage) = chunk.usage {
            self.totals = TokenTotals {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
            };
        }
        self.output.push_str(&chunk.text);

        first
    }
}

/// Produce the outbound event stream for one validated question.
///
/// Emits one `Token` event per upstream chunk in arrival order, then a
/// single terminal `Done` or `Error` event. The trace is finalized after
/// the terminal event on both paths; dropping the returned stream stops
/// pulling from the upstream.
pub fn answer_stream(
    upstream: Arc<dyn UpstreamClient>,
    tracer: BestEffortTracer,
    model: String,
    question: String,
) -> impl Stream<Item = OutboundEvent> + Send {
    async_stream::stream! {
        let call = CallStart {
            name: RUN_NAME.to_string(),
            question: question.clone(),
            model: model.clone(),
        };
        let handle = tracer.start(&call).await;
        let mut trace = CallTrace::new();

        let mut chunks = match upstream.generate(&model, &question).await {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::error!(error = %e, model = %model, "Failed to open upstream stream");
                yield OutboundEvent::Error;
                tracer
                    .end(handle, CallOutcome::Failure { message: e.to_string() })
                    .await;
                return;
            }
        };

        loop {
            match chunks.next().await {
                Some(Ok(chunk)) => {
                    if trace.observe(&chunk) {
                        tracer.add_event(handle.as_ref(), FIRST_TOKEN_EVENT).await;
                    }
                    yield OutboundEvent::Token(chunk.text);
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, model = %model, "Upstream stream failed");
                    yield OutboundEvent::Error;
                    tracer
                        .end(handle, CallOutcome::Failure { message: e.to_string() })
                        .await;
                    return;
                }
                None => {
                    yield OutboundEvent::Done;
                    tracer
                        .end(
                            handle,
                            CallOutcome::Success {
                                output: trace.output,
                                totals: trace.totals,
                            },
                        )
                        .await;
                    return;
                }
            }
        }
    }
}
