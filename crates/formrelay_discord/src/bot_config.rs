//! Discord bot credentials.

/// Discord bot configuration.
///
/// Kept apart from `RelayConfig` so the token never ends up in a config file.
#[derive(Clone)]
pub struct DiscordBotConfig {
    /// Discord bot token (required).
    pub bot_token: String,
    /// Register commands to this guild only instead of globally. Guild
    /// commands show up immediately, global ones can take up to an hour.
    pub command_guild: Option<u64>,
}

impl std::fmt::Debug for DiscordBotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordBotConfig")
            .field("bot_token", &"<redacted>")
            .field("command_guild", &self.command_guild)
            .finish()
    }
}

impl DiscordBotConfig {
    /// Load Discord bot configuration from environment variables.
    ///
    /// Returns `None` if no token is set.
    ///
    /// # Environment Variables
    ///
    /// - `DISCORD_BOT_TOKEN` or `DISCORD_TOKEN` -> bot_token (required for Some result)
    /// - `DISCORD_GUILD_ID` -> command_guild
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let bot_token = var("DISCORD_BOT_TOKEN")
            .or_else(|| var("DISCORD_TOKEN"))
            .filter(|token| !token.trim().is_empty())?;

        let command_guild = var("DISCORD_GUILD_ID").and_then(|id| id.trim().parse().ok());

        Some(Self {
            bot_token,
            command_guild,
        })
    }
}
