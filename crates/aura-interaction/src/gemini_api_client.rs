//! GeminiApiClient - Direct REST API implementation for Gemini.
//!
//! Sends the shared transcript plus the composed system instruction to
//! `generateContent` and returns the first candidate's text.

use async_trait::async_trait;
use aura_core::ai::{AiClient, AiFailure, TranscriptEntry};
use aura_core::config::{AiSettings, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`AiClient`] that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiApiClient {
    /// Creates a client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: build_http_client(DEFAULT_TIMEOUT),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Builds a client from the `[ai]` configuration section.
    pub fn from_settings(settings: &AiSettings) -> Result<Self, AiFailure> {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AiFailure::NotConfigured("no API key configured".into()))?;

        let model = if settings.model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            settings.model.trim()
        };

        Ok(Self::new(api_key, model)
            .with_base_url(settings.endpoint.clone())
            .with_timeout(Duration::from_secs(settings.request_timeout_secs)))
    }

    /// Points the client at a different models endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the whole-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, AiFailure> {
        let url = format!(
            "{}/{model}:generateContent",
            self.base_url,
            model = self.model
        );

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|err| AiFailure::Transport {
                is_timeout: err.is_timeout(),
                // The URL carries the API key.
                message: err.without_url().to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            AiFailure::MalformedResponse(format!(
                "Failed to parse Gemini response: {}",
                err.without_url()
            ))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl AiClient for GeminiApiClient {
    async fn generate(
        &self,
        transcript: &[TranscriptEntry],
        system_instruction: &str,
    ) -> Result<String, AiFailure> {
        if self.api_key.trim().is_empty() {
            return Err(AiFailure::NotConfigured("no API key configured".into()));
        }

        let request = GenerateContentRequest::new(transcript, system_instruction);
        tracing::debug!(
            "[GeminiApiClient] generateContent model={} turns={}",
            self.model,
            request.contents.len()
        );

        let result = self.send_request(&request).await;
        if let Err(failure) = &result {
            tracing::warn!("[GeminiApiClient] Request failed: {}", failure);
        }
        result
    }
}

fn build_http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

impl GenerateContentRequest {
    fn new(transcript: &[TranscriptEntry], system_instruction: &str) -> Self {
        let contents = transcript
            .iter()
            .map(|entry| Content {
                role: Some(entry.role.as_str().to_string()),
                parts: vec![Part {
                    text: entry.text.clone(),
                }],
            })
            .collect();

        let system_instruction = (!system_instruction.trim().is_empty()).then(|| Content {
            role: None,
            parts: vec![Part {
                text: system_instruction.to_string(),
            }],
        });

        Self {
            contents,
            system_instruction,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, AiFailure> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            AiFailure::MalformedResponse("Gemini API returned no text in the first candidate".into())
        })
}

fn map_http_error(status: StatusCode, body: &str) -> AiFailure {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    AiFailure::Status {
        status: status.as_u16(),
        message,
    }
}
