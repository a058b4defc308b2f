//! Bot service object and the serenity event handler that drives it.

use std::sync::Arc;

use async_trait::async_trait;
use formrelay_core::{messages, CommandRelay, DiscordAppConfig};
use serenity::{
    client::{Context, EventHandler},
    model::{
        application::{Command, CommandInteraction, Interaction},
        channel::{ChannelType, Message},
        gateway::Ready,
        guild::Guild,
        id::{ChannelId, GuildId},
    },
};
use tracing::{debug, error, info, warn};

use crate::bot_config::DiscordBotConfig;
use crate::slash_commands::{self, create_commands};

/// Everything a handler needs, built once at startup.
#[derive(Debug)]
pub struct DiscordBot {
    relay: Arc<CommandRelay>,
    app: DiscordAppConfig,
    config: DiscordBotConfig,
}

impl DiscordBot {
    pub fn new(relay: Arc<CommandRelay>, app: DiscordAppConfig, config: DiscordBotConfig) -> Self {
        Self { relay, app, config }
    }

    pub fn relay(&self) -> &CommandRelay {
        &self.relay
    }

    /// Invitation text if `content` is a greeting.
    pub fn greeting_reply(&self, content: &str) -> Option<String> {
        messages::is_greeting(content).then(|| messages::invitation(&self.app))
    }

    pub fn onboarding_manual(&self) -> String {
        messages::onboarding_manual(&self.app)
    }

    /// Route one slash command to its handler and report any failure.
    pub async fn handle_command(&self, ctx: &Context, command: &CommandInteraction) {
        info!(
            command = %command.data.name,
            user_id = %command.user.id,
            "Slash command received"
        );

        let result = match command.data.name.as_str() {
            slash_commands::SETTING => {
                slash_commands::handle_setting_command(ctx, command, &self.relay).await
            }
            slash_commands::ADD => {
                slash_commands::handle_add_command(ctx, command, &self.relay).await
            }
            slash_commands::AI => slash_commands::handle_ai_command(ctx, command, &self.relay).await,
            other => {
                warn!("Ignoring unknown command /{other}");
                return;
            }
        };

        if let Err(e) = result {
            slash_commands::report_failure(ctx, command, &e).await;
        }
    }

    async fn register_commands(&self, ctx: &Context) {
        let commands = create_commands(self.relay.ai_enabled());

        let registered = match self.config.command_guild {
            Some(guild) => GuildId::new(guild).set_commands(&ctx.http, commands).await,
            None => Command::set_global_commands(&ctx.http, commands).await,
        };

        match registered {
            Ok(commands) => info!(
                count = commands.len(),
                guild = ?self.config.command_guild,
                "Registered slash commands"
            ),
            Err(e) => error!("Failed to register slash commands: {e}"),
        }
    }

    async fn send_onboarding(&self, ctx: &Context, guild: &Guild) {
        let bot_id = ctx.cache.current_user().id;

        let target = first_sendable(
            guild
                .channels
                .values()
                .filter(|channel| channel.kind == ChannelType::Text)
                .map(|channel| {
                    let can_send = channel
                        .permissions_for_user(&ctx.cache, bot_id)
                        .map(|perms| perms.send_messages())
                        .unwrap_or(false);
                    (channel.position, channel.id, can_send)
                }),
        );

        let Some(channel) = target else {
            info!(guild = %guild.name, "No channel to post the manual in");
            return;
        };

        if let Err(e) = channel.say(&ctx.http, self.onboarding_manual()).await {
            warn!(guild = %guild.name, "Could not post the manual: {e}");
        }
    }
}

/// The first channel, by position, the bot is allowed to write in.
pub fn first_sendable(
    channels: impl IntoIterator<Item = (u16, ChannelId, bool)>,
) -> Option<ChannelId> {
    channels
        .into_iter()
        .filter(|(_, _, can_send)| *can_send)
        .min_by_key(|(position, id, _)| (*position, *id))
        .map(|(_, id, _)| id)
}

/// Event handler that forwards serenity events to a [`DiscordBot`].
pub struct DiscordEventHandler {
    bot: Arc<DiscordBot>,
}

impl DiscordEventHandler {
    pub fn new(bot: Arc<DiscordBot>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl EventHandler for DiscordEventHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected", ready.user.name);
        self.bot.register_commands(&ctx).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.is_own(&ctx.cache) {
            return;
        }

        let Some(reply) = self.bot.greeting_reply(&msg.content) else {
            return;
        };

        debug!(channel = %msg.channel_id, "Answering greeting");
        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            warn!("Could not answer greeting: {e}");
        }
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new != Some(true) {
            return;
        }

        info!(guild = %guild.name, "Joined new guild");
        self.bot.send_onboarding(&ctx, &guild).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            self.bot.handle_command(&ctx, &command).await;
        }
    }
}
