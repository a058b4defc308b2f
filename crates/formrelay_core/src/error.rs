use miette::Diagnostic;
use thiserror::Error;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Configuration-specific errors
#[derive(Error, Diagnostic, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Could not read config file {path}: {cause}")]
    #[diagnostic(code(formrelay_core::config::io))]
    Io { path: String, cause: String },

    #[error("TOML parse error in {path}: {cause}")]
    #[diagnostic(
        code(formrelay_core::config::toml_parse),
        help("Check the file against formrelay.example.toml")
    )]
    TomlParse { path: String, cause: String },

    #[error("Missing required field: {0}")]
    #[diagnostic(
        code(formrelay_core::config::missing_field),
        help("Set it in the config file or through its environment variable")
    )]
    MissingField(String),

    #[error("Invalid value for field {field}: {reason}")]
    #[diagnostic(code(formrelay_core::config::invalid_value))]
    InvalidValue { field: String, reason: String },
}

/// Errors raised while relaying a command to one of the remote services.
///
/// A user who has not registered a form, or a remote service answering with
/// a non-200 status, is *not* an error: those become ordinary replies.
#[derive(Error, Diagnostic, Debug)]
pub enum RelayError {
    #[error("Request to {endpoint} failed: {source}")]
    #[diagnostic(
        code(formrelay_core::http),
        help("The remote service could not be reached or the connection dropped")
    )]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed configuration lookup for user {user_id}: {reason}")]
    #[diagnostic(
        code(formrelay_core::malformed_lookup),
        help("The backend must answer with `content` and `entry` fields, or the `ID not found` error")
    )]
    MalformedLookup { user_id: String, reason: String },

    #[error("Configuration backend reported an error: {0}")]
    #[diagnostic(code(formrelay_core::backend_error))]
    BackendError(String),

    #[error("Configuration lookup failed with status {0}")]
    #[diagnostic(code(formrelay_core::lookup_status))]
    LookupStatus(u16),

    #[error("Malformed completion response: {0}")]
    #[diagnostic(code(formrelay_core::malformed_completion))]
    MalformedCompletion(String),

    #[error("The AI command is not enabled")]
    #[diagnostic(
        code(formrelay_core::ai_disabled),
        help("Set AI_API_KEY to enable the /ai command")
    )]
    AiDisabled,
}

impl RelayError {
    pub(crate) fn http(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            endpoint: endpoint.into(),
            source,
        }
    }
}
