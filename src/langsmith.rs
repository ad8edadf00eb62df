//! Optional LangSmith run tracing for completion calls.
//!
//! Runs are submitted in the background; a failed submission is logged and
//! never affects the reply sent to the user.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::TracingConfig;
use crate::llm::{to_messages, ChatMessage, Completion};
use crate::prompt::PromptSpec;

const RUN_NAME: &str = "joke-generation";

#[derive(Debug, Serialize)]
struct RunInputs {
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct RunOutputs {
    text: String,
}

#[derive(Debug, Serialize)]
struct RunExtra<'a> {
    model: &'a str,
}

/// A completed run in the shape accepted by `POST /runs`.
#[derive(Debug, Serialize)]
struct Run<'a> {
    id: Uuid,
    name: &'static str,
    run_type: &'static str,
    session_name: &'a str,
    inputs: RunInputs,
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<RunOutputs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    extra: RunExtra<'a>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

/// Submits runs to LangSmith when tracing is configured.
#[derive(Clone)]
pub struct RunTracer {
    client: reqwest::Client,
    config: Option<TracingConfig>,
}

impl RunTracer {
    pub fn new(config: Option<TracingConfig>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    fn run_body(
        config: &TracingConfig,
        model: &str,
        prompt: &PromptSpec,
        outcome: &Result<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> serde_json::Value {
        let (outputs, error) = match outcome {
            Ok(text) => (Some(RunOutputs { text: text.clone() }), None),
            Err(e) => (None, Some(format!("{:#}", e))),
        };
        let run = Run {
            id: Uuid::new_v4(),
            name: RUN_NAME,
            run_type: "llm",
            session_name: &config.project,
            inputs: RunInputs {
                messages: to_messages(prompt),
            },
            outputs,
            error,
            extra: RunExtra { model },
            start_time,
            end_time,
        };
        serde_json::to_value(&run).unwrap_or_default()
    }

    async fn submit(
        client: reqwest::Client,
        config: TracingConfig,
        body: serde_json::Value,
    ) -> Result<()> {
        let url = format!("{}/runs", config.endpoint);
        let response = client
            .post(&url)
            .header("x-api-key", &config.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send run to LangSmith")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("LangSmith API error ({}): {}", status, error_body);
        }
        debug!("Run submitted to LangSmith project {}", config.project);
        Ok(())
    }

    /// Record one completion call. Returns immediately.
    pub fn record(
        &self,
        model: &str,
        prompt: &PromptSpec,
        outcome: &Result<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) {
        let Some(config) = self.config.clone() else {
            return;
        };
        let body = Self::run_body(&config, model, prompt, outcome, start_time, end_time);
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = Self::submit(client, config, body).await {
                warn!("Run tracing failed: {:#}", e);
            }
        });
    }
}

/// Wraps a completion client and traces every call.
pub struct TracedCompletion<C> {
    inner: C,
    model: String,
    tracer: RunTracer,
}

impl<C: Completion> TracedCompletion<C> {
    pub fn new(inner: C, model: impl Into<String>, tracer: RunTracer) -> Self {
        Self {
            inner,
            model: model.into(),
            tracer,
        }
    }
}

#[async_trait]
impl<C: Completion> Completion for TracedCompletion<C> {
    async fn complete(&self, prompt: &PromptSpec) -> Result<String> {
        let start_time = Utc::now();
        let outcome = self.inner.complete(prompt).await;
        self.tracer
            .record(&self.model, prompt, &outcome, start_time, Utc::now());
        outcome
    }
}
