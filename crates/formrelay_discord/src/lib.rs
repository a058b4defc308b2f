//! formrelay Discord - serenity front end for the command relay
//!
//! Registers the `/setting`, `/add` and `/ai` slash commands, hands each
//! invocation to a [`formrelay_core::CommandRelay`] and answers with its
//! reply. Also answers "hi" and posts a usage manual on joining a guild.
//!
//! ## Configuration
//!
//! The token comes from [`DiscordBotConfig::from_env()`]; everything else
//! comes from `formrelay_core::RelayConfig`. Both are loaded once at
//! startup and passed to the bot.

pub mod bot;
pub mod bot_config;
pub mod error;
pub mod slash_commands;

pub use bot::{DiscordBot, DiscordEventHandler};
pub use bot_config::DiscordBotConfig;
pub use error::{DiscordError, Result};

// Re-export serenity for convenience
pub use serenity;
