//! Request handler for `POST /ask`

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;

use super::server::AppState;
use super::streaming::answer_stream;

/// Request payload for asking a question
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub question: String,
}

/// Ask a question and stream the model's answer as server-sent events.
///
/// Invalid input is rejected here, before any upstream or trace call.
/// Once the stream starts, failures surface in-stream (`[ERROR]` frame),
/// never as an HTTP error.
pub async fn ask(State(state): State<AppState>, Json(payload): Json<Question>) -> Response {
    if payload.question.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "question must not be empty"})),
        )
            .into_response();
    }

    let events = answer_stream(
        state.upstream.clone(),
        state.tracer.clone(),
        state.config.upstream.model.clone(),
        payload.question,
    );

    let body = Body::from_stream(events.map(|event| Ok::<_, Infallible>(event.encode())));

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        body,
    )
        .into_response()
}
