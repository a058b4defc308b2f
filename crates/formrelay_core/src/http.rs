//! reqwest implementations of the relay's outbound collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::AiConfig;
use crate::error::{RelayError, Result};
use crate::relay::{AiReply, CompletionClient, ConfigBackend, FormLookup, FormSubmitter, FormTarget};

/// Error value the backend returns for users that never ran `/setting`.
pub const NOT_FOUND_SENTINEL: &str = "ID not found";

/// Build the HTTP client shared by every outbound call.
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RelayError::http("client builder", e))
}

/// Apps Script web app storing user id → (form URL, entry id).
#[derive(Debug, Clone)]
pub struct HttpConfigBackend {
    client: Client,
    script_url: String,
}

impl HttpConfigBackend {
    pub fn new(client: Client, script_url: impl Into<String>) -> Self {
        Self {
            client,
            script_url: script_url.into(),
        }
    }
}

#[async_trait]
impl ConfigBackend for HttpConfigBackend {
    async fn save(&self, user_id: &str, form_url: &str, entry_id: &str) -> Result<StatusCode> {
        debug!(user_id, "POST settings to backend");
        let response = self
            .client
            .post(&self.script_url)
            .form(&[
                ("userId", user_id),
                ("content", form_url),
                ("entry", entry_id),
            ])
            .send()
            .await
            .map_err(|e| RelayError::http(&self.script_url, e))?;

        Ok(response.status())
    }

    async fn lookup(&self, user_id: &str) -> Result<FormLookup> {
        debug!(user_id, "GET settings from backend");
        let response = self
            .client
            .get(&self.script_url)
            .query(&[("userId", user_id)])
            .send()
            .await
            .map_err(|e| RelayError::http(&self.script_url, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::http(&self.script_url, e))?;

        // The body decides the outcome; the status only matters when the
        // body can't be read as a lookup answer.
        match decode_lookup(user_id, &body) {
            Err(RelayError::MalformedLookup { .. }) if status != StatusCode::OK => {
                Err(RelayError::LookupStatus(status.as_u16()))
            }
            decoded => decoded,
        }
    }
}

/// Decode the backend's lookup answer.
///
/// `entry` is accepted as a string or a number since the Apps Script side
/// hands back whatever the spreadsheet cell holds.
pub fn decode_lookup(user_id: &str, body: &str) -> Result<FormLookup> {
    let malformed = |reason: &str| RelayError::MalformedLookup {
        user_id: user_id.to_string(),
        reason: reason.to_string(),
    };

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(&format!("body is not JSON ({e})")))?;
    let object = value
        .as_object()
        .ok_or_else(|| malformed("body is not a JSON object"))?;

    if let Some(error) = object.get("error") {
        return match error.as_str() {
            Some(NOT_FOUND_SENTINEL) => Ok(FormLookup::NotRegistered),
            Some(other) => Err(RelayError::BackendError(other.to_string())),
            None => Err(RelayError::BackendError(error.to_string())),
        };
    }

    let content_url = object
        .get("content")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| malformed("missing string field `content`"))?;

    let entry_number = match object.get("entry") {
        Some(Value::String(entry)) if !entry.is_empty() => entry.clone(),
        Some(Value::Number(entry)) => entry.to_string(),
        _ => return Err(malformed("missing field `entry`")),
    };

    Ok(FormLookup::Found(FormTarget {
        content_url: content_url.to_string(),
        entry_number,
    }))
}

/// Posts content straight to a Google Form's `formResponse` endpoint.
#[derive(Debug, Clone)]
pub struct HttpFormSubmitter {
    client: Client,
}

impl HttpFormSubmitter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FormSubmitter for HttpFormSubmitter {
    async fn submit(&self, target: &FormTarget, content: &str) -> Result<StatusCode> {
        debug!(url = %target.content_url, field = %target.field_name(), "POST form");
        let response = self
            .client
            .post(&target.content_url)
            .form(&[(target.field_name(), content)])
            .send()
            .await
            .map_err(|e| RelayError::http(&target.content_url, e))?;

        Ok(response.status())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpCompletionClient {
    pub fn new(client: Client, config: &AiConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, content: &str) -> Result<AiReply> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content,
            }],
        };

        debug!(model = %self.model, len = content.len(), "POST chat completion");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RelayError::http(&self.api_url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(AiReply::Failed(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RelayError::http(&self.api_url, e))?;
        decode_completion(&body).map(AiReply::Message)
    }
}

/// Text of the first choice in a chat completion response.
fn decode_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| RelayError::MalformedCompletion(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| RelayError::MalformedCompletion("no choices in response".to_string()))
}
