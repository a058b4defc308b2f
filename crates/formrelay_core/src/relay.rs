//! The command relay: maps each command to its outbound calls and turns the
//! remote result into a reply.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{info, warn};

use crate::error::{RelayError, Result};
use crate::messages;

/// One command invocation, built per call and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub user_id: String,
    pub content: String,
    pub entry_id: Option<String>,
}

impl CommandRequest {
    pub fn new(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            content: content.into(),
            entry_id: None,
        }
    }

    pub fn with_entry(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = Some(entry_id.into());
        self
    }
}

/// Where a user's submissions go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormTarget {
    /// Form submission endpoint (usually ending in `/formResponse`).
    pub content_url: String,
    /// Numeric id of the form field, without the `entry.` prefix.
    pub entry_number: String,
}

impl FormTarget {
    /// Form field name the content is posted under.
    pub fn field_name(&self) -> String {
        format!("entry.{}", self.entry_number)
    }
}

/// Outcome of looking a user up in the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormLookup {
    Found(FormTarget),
    NotRegistered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiReply {
    Message(String),
    /// The completion API answered with this non-200 status.
    Failed(u16),
}

/// Text sent back to the invoking user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    /// Only the invoking user sees the reply.
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

/// Storage of per-user form settings (the Apps Script web app).
#[async_trait]
pub trait ConfigBackend: Send + Sync + std::fmt::Debug {
    /// Store `form_url` and `entry_id` for `user_id`. Returns the backend's status.
    async fn save(&self, user_id: &str, form_url: &str, entry_id: &str) -> Result<StatusCode>;

    async fn lookup(&self, user_id: &str) -> Result<FormLookup>;
}

#[async_trait]
pub trait FormSubmitter: Send + Sync + std::fmt::Debug {
    async fn submit(&self, target: &FormTarget, content: &str) -> Result<StatusCode>;
}

#[async_trait]
pub trait CompletionClient: Send + Sync + std::fmt::Debug {
    async fn complete(&self, content: &str) -> Result<AiReply>;
}

/// Service object shared by every command handler.
///
/// Holds no mutable state; each operation is a fixed sequence of awaited
/// outbound calls with no retries.
#[derive(Debug, Clone)]
pub struct CommandRelay {
    backend: Arc<dyn ConfigBackend>,
    submitter: Arc<dyn FormSubmitter>,
    completion: Option<Arc<dyn CompletionClient>>,
    ai_failure_message: String,
}

impl CommandRelay {
    pub fn new(backend: Arc<dyn ConfigBackend>, submitter: Arc<dyn FormSubmitter>) -> Self {
        Self {
            backend,
            submitter,
            completion: None,
            ai_failure_message: String::new(),
        }
    }

    /// Turn on the `/ai` command.
    pub fn with_completion(
        mut self,
        completion: Arc<dyn CompletionClient>,
        failure_message: impl Into<String>,
    ) -> Self {
        self.completion = Some(completion);
        self.ai_failure_message = failure_message.into();
        self
    }

    pub fn ai_enabled(&self) -> bool {
        self.completion.is_some()
    }

    /// `/setting`: store the form URL and field id for the invoking user.
    ///
    /// Nothing is validated locally; whatever the user typed is forwarded.
    pub async fn register(&self, request: &CommandRequest) -> Result<Reply> {
        let entry_id = request.entry_id.as_deref().unwrap_or_default();
        info!(user_id = %request.user_id, "Saving form settings");

        let status = self
            .backend
            .save(&request.user_id, &request.content, entry_id)
            .await?;

        if status == StatusCode::OK {
            Ok(Reply::public(messages::URL_SAVED))
        } else {
            warn!(user_id = %request.user_id, status = status.as_u16(), "Backend refused settings");
            Ok(Reply::public(messages::save_failed(status.as_u16())))
        }
    }

    /// `/add`: look the user's form up, then post the content to it.
    pub async fn submit(&self, request: &CommandRequest) -> Result<Reply> {
        info!(user_id = %request.user_id, "Submitting content");

        let target = match self.backend.lookup(&request.user_id).await? {
            FormLookup::Found(target) => target,
            FormLookup::NotRegistered => {
                info!(user_id = %request.user_id, "No form registered");
                // Discord keeps the visibility of the deferred response for
                // the first follow-up, so after a public defer this still
                // shows in the channel.
                return Ok(Reply::ephemeral(messages::NO_USER_FOUND));
            }
        };

        let status = self.submitter.submit(&target, &request.content).await?;

        if status == StatusCode::OK {
            Ok(Reply::public(messages::submitted(&request.content)))
        } else {
            warn!(
                user_id = %request.user_id,
                url = %target.content_url,
                status = status.as_u16(),
                "Form submission failed"
            );
            Ok(Reply::public(messages::submission_failed(status.as_u16())))
        }
    }

    /// `/ai`: forward free text to the completion API.
    pub async fn ask_ai(&self, content: &str) -> Result<Reply> {
        let completion = self.completion.as_ref().ok_or(RelayError::AiDisabled)?;

        match completion.complete(content).await? {
            AiReply::Message(text) => Ok(Reply::public(messages::truncate_for_discord(&text))),
            AiReply::Failed(status) => {
                warn!(status, "Completion API failed");
                Ok(Reply::public(self.ai_failure_message.clone()))
            }
        }
    }
}
