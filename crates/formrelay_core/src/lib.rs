//! formrelay core - command relay for the Google Forms Discord bot
//!
//! This crate holds everything that does not depend on Discord itself:
//! the [`CommandRelay`] service, the HTTP clients it talks through,
//! configuration loading and the fixed reply texts.
//!
//! The relay never persists anything. Per-user form configuration lives in
//! the Apps Script backend and is addressed only by the user's id.

pub mod config;
pub mod error;
pub mod http;
pub mod messages;
pub mod relay;

#[cfg(test)]
pub mod test_helpers;

pub use config::{AiConfig, BackendConfig, DiscordAppConfig, HealthConfig, RelayConfig};
pub use error::{ConfigError, RelayError, Result};
pub use reqwest::StatusCode;

pub use http::{HttpCompletionClient, HttpConfigBackend, HttpFormSubmitter};
pub use relay::{
    AiReply, CommandRelay, CommandRequest, CompletionClient, ConfigBackend, FormLookup,
    FormSubmitter, FormTarget, Reply,
};
