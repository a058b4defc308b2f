use formrelay_core::RelayError;
use miette::Diagnostic;
use serenity::http::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscordError>;

/// Discord error code for an interaction whose token is no longer valid.
pub const UNKNOWN_INTERACTION: isize = 10062;
/// Returned for follow-ups once the interaction webhook has expired.
pub const UNKNOWN_WEBHOOK: isize = 10015;

#[derive(Debug, Error, Diagnostic)]
pub enum DiscordError {
    #[error("Discord API error: {0}")]
    #[diagnostic(code(formrelay_discord::serenity))]
    Serenity(#[from] serenity::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Relay(#[from] RelayError),

    #[error("Missing required option `{0}`")]
    #[diagnostic(
        code(formrelay_discord::missing_option),
        help("The registered slash commands may be out of date; restart the bot to sync them")
    )]
    MissingOption(&'static str),
}

impl DiscordError {
    /// The interaction token expired before we could answer, so nothing more
    /// can be sent through it.
    pub fn is_interaction_expired(&self) -> bool {
        match self {
            Self::Serenity(serenity::Error::Http(HttpError::UnsuccessfulRequest(response))) => {
                is_expired_response(response.error.code, response.status_code.as_u16())
            }
            _ => false,
        }
    }
}

/// Classify an unsuccessful interaction request by Discord error code and
/// HTTP status.
pub fn is_expired_response(code: isize, status: u16) -> bool {
    matches!(code, UNKNOWN_INTERACTION | UNKNOWN_WEBHOOK) || status == 404
}
