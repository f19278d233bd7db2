//! LangSmith-compatible run recorder

use async_trait::async_trait;
use serde_json::json;

use super::{CallOutcome, CallStart, TraceError, TraceHandle, TraceRecorder};

/// Records call traces as LangSmith runs (POST on start, PATCH on end)
pub struct LangsmithRecorder {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    project: String,
}

impl LangsmithRecorder {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            project: project.into(),
        }
    }

    fn runs_url(&self) -> String {
        format!("{}/runs", self.endpoint.trim_end_matches('/'))
    }

    fn start_body(&self, handle: &TraceHandle, call: &CallStart) -> serde_json::Value {
        json!({
            "id": handle.run_id,
            "name": call.name,
            "run_type": "llm",
            "start_time": handle.started_at.to_rfc3339(),
            "session_name": self.project,
            "inputs": { "prompt": call.question },
            "extra": {
                "metadata": {
                    "ls_model_name": call.model,
                    "ls_model_type": "llm",
                    "ls_provider": "google_genai",
                },
                "options": { "streaming": true },
            },
        })
    }

    fn end_body(&self, handle: &TraceHandle, outcome: &CallOutcome) -> serde_json::Value {
        let events: Vec<serde_json::Value> = handle
            .events()
            .iter()
            .map(|e| json!({ "name": e.name, "time": e.at.to_rfc3339() }))
            .collect();

        let mut body = json!({
            "end_time": chrono::Utc::now().to_rfc3339(),
            "events": events,
        });

        match outcome {
            CallOutcome::Success { output, totals } => {
                body["outputs"] = json!({ "output": output });
                body["extra"] = json!({
                    "metadata": {
                        "usage_metadata": {
                            "input_tokens": totals.input_tokens,
                            "output_tokens": totals.output_tokens,
                            "total_tokens": totals.total(),
                        },
                    },
                });
            }
            CallOutcome::Failure { message } => {
                body["error"] = json!(message);
            }
        }

        body
    }

    fn check_status(response: &reqwest::Response) -> Result<(), TraceError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TraceError::Status(status.as_u16()))
        }
    }
}

#[async_trait]
impl TraceRecorder for LangsmithRecorder {
    async fn start(&self, call: &CallStart) -> Result<TraceHandle, TraceError> {
        let handle = TraceHandle::new();
        let response = self
            .http
            .post(self.runs_url())
            .header("x-api-key", &self.api_key)
            .json(&self.start_body(&handle, call))
            .send()
            .await?;
        Self::check_status(&response)?;
        Ok(handle)
    }

    async fn add_event(&self, handle: &TraceHandle, name: &str) -> Result<(), TraceError> {
        // Events are buffered on the handle and shipped with the end patch
        handle.push_event(name);
        Ok(())
    }

    async fn end(&self, handle: TraceHandle, outcome: CallOutcome) -> Result<(), TraceError> {
        let url = format!("{}/{}", self.runs_url(), handle.run_id);
        let response = self
            .http
            .patch(&url)
            .header("x-api-key", &self.api_key)
            .json(&self.end_body(&handle, &outcome))
            .send()
            .await?;
        Self::check_status(&response)
    }

    fn name(&self) -> &str {
        "langsmith"
    }
}
