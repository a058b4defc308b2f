#![cfg(test)]

//! Recording fakes for the relay's outbound collaborators.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{RelayError, Result};
use crate::relay::{AiReply, CompletionClient, ConfigBackend, FormLookup, FormSubmitter, FormTarget};

#[derive(Debug, Clone)]
enum LookupBehavior {
    Found(FormTarget),
    NotRegistered,
    Malformed,
}

/// Backend fake that records every save and lookup.
#[derive(Debug)]
pub struct FakeBackend {
    lookup: LookupBehavior,
    save_status: StatusCode,
    saves: Mutex<Vec<(String, String, String)>>,
    lookups: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn with(lookup: LookupBehavior, save_status: StatusCode) -> Self {
        Self {
            lookup,
            save_status,
            saves: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Every user has a form at `url` with field `entry`.
    pub fn registered(url: &str, entry: &str) -> Self {
        Self::with(
            LookupBehavior::Found(FormTarget {
                content_url: url.to_string(),
                entry_number: entry.to_string(),
            }),
            StatusCode::OK,
        )
    }

    pub fn unregistered() -> Self {
        Self::with(LookupBehavior::NotRegistered, StatusCode::OK)
    }

    /// Lookups fail as if the backend sent an unexpected body.
    pub fn malformed() -> Self {
        Self::with(LookupBehavior::Malformed, StatusCode::OK)
    }

    /// Saves answer with `status`.
    pub fn saving(status: StatusCode) -> Self {
        Self::with(LookupBehavior::NotRegistered, status)
    }

    pub fn saves(&self) -> Vec<(String, String, String)> {
        self.saves.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfigBackend for FakeBackend {
    async fn save(&self, user_id: &str, form_url: &str, entry_id: &str) -> Result<StatusCode> {
        self.saves.lock().unwrap().push((
            user_id.to_string(),
            form_url.to_string(),
            entry_id.to_string(),
        ));
        Ok(self.save_status)
    }

    async fn lookup(&self, user_id: &str) -> Result<FormLookup> {
        self.lookups.lock().unwrap().push(user_id.to_string());
        match &self.lookup {
            LookupBehavior::Found(target) => Ok(FormLookup::Found(target.clone())),
            LookupBehavior::NotRegistered => Ok(FormLookup::NotRegistered),
            LookupBehavior::Malformed => Err(RelayError::MalformedLookup {
                user_id: user_id.to_string(),
                reason: "missing field `content`".to_string(),
            }),
        }
    }
}

/// Form endpoint fake answering every submission with a fixed status.
#[derive(Debug)]
pub struct FakeSubmitter {
    status: StatusCode,
    calls: Mutex<Vec<(FormTarget, String)>>,
}

impl FakeSubmitter {
    pub fn answering(status: StatusCode) -> Self {
        Self {
            status,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(FormTarget, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormSubmitter for FakeSubmitter {
    async fn submit(&self, target: &FormTarget, content: &str) -> Result<StatusCode> {
        self.calls
            .lock()
            .unwrap()
            .push((target.clone(), content.to_string()));
        Ok(self.status)
    }
}

#[derive(Debug)]
pub struct FakeCompletion {
    reply: AiReply,
}

impl FakeCompletion {
    pub fn new(reply: AiReply) -> Self {
        Self { reply }
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(&self, _content: &str) -> Result<AiReply> {
        Ok(self.reply.clone())
    }
}
