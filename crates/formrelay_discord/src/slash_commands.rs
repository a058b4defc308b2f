//! Discord slash command implementations

use formrelay_core::{messages, CommandRelay, CommandRequest, Reply};
use serenity::{
    builder::{CreateCommand, CreateCommandOption, CreateInteractionResponseFollowup},
    client::Context,
    model::application::{CommandDataOption, CommandInteraction, CommandOptionType},
};
use tracing::{error, warn};

use crate::error::{DiscordError, Result};

pub const SETTING: &str = "setting";
pub const ADD: &str = "add";
pub const AI: &str = "ai";

/// Create all slash commands for registration.
///
/// `/ai` is left out unless the relay has a completion client.
pub fn create_commands(ai_enabled: bool) -> Vec<CreateCommand> {
    let mut commands = vec![
        CreateCommand::new(SETTING)
            .description("Save the URL of your Google Form")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "content",
                    "Google Form formResponse URL",
                )
                .required(true),
            )
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "entry",
                    "Input field ID (the number after 'entry.')",
                )
                .required(true),
            ),
        CreateCommand::new(ADD)
            .description("Add content to Google Forms")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "content", "Text to submit")
                    .required(true),
            ),
    ];

    if ai_enabled {
        commands.push(
            CreateCommand::new(AI).description("Ask the AI").add_option(
                CreateCommandOption::new(CommandOptionType::String, "content", "Your question")
                    .required(true),
            ),
        );
    }

    commands
}

/// Value of a string option by name.
fn string_option<'a>(options: &'a [CommandDataOption], name: &'static str) -> Result<&'a str> {
    options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_str())
        .ok_or(DiscordError::MissingOption(name))
}

/// Build the relay request for `/setting` (with entry) or `/add` and `/ai`.
pub fn command_request(
    user_id: impl Into<String>,
    options: &[CommandDataOption],
    with_entry: bool,
) -> Result<CommandRequest> {
    let request = CommandRequest::new(user_id, string_option(options, "content")?);
    if with_entry {
        Ok(request.with_entry(string_option(options, "entry")?))
    } else {
        Ok(request)
    }
}

/// Handle the /setting command
pub async fn handle_setting_command(
    ctx: &Context,
    command: &CommandInteraction,
    relay: &CommandRelay,
) -> Result<()> {
    command.defer(&ctx.http).await?;

    let request = command_request(command.user.id.to_string(), &command.data.options, true)?;
    let reply = relay.register(&request).await?;

    send_reply(ctx, command, reply).await
}

/// Handle the /add command
pub async fn handle_add_command(
    ctx: &Context,
    command: &CommandInteraction,
    relay: &CommandRelay,
) -> Result<()> {
    command.defer(&ctx.http).await?;

    let request = command_request(command.user.id.to_string(), &command.data.options, false)?;
    let reply = relay.submit(&request).await?;

    send_reply(ctx, command, reply).await
}

/// Handle the /ai command
pub async fn handle_ai_command(
    ctx: &Context,
    command: &CommandInteraction,
    relay: &CommandRelay,
) -> Result<()> {
    command.defer(&ctx.http).await?;

    let content = string_option(&command.data.options, "content")?;
    let reply = relay.ask_ai(content).await?;

    send_reply(ctx, command, reply).await
}

/// Send the relay's reply as a follow-up to the deferred response.
///
/// `reply.ephemeral` only takes effect on follow-ups after the first one;
/// the first inherits the public visibility of `defer`.
async fn send_reply(ctx: &Context, command: &CommandInteraction, reply: Reply) -> Result<()> {
    command
        .create_followup(
            &ctx.http,
            CreateInteractionResponseFollowup::new()
                .content(reply.content)
                .ephemeral(reply.ephemeral),
        )
        .await?;

    Ok(())
}

/// Tell the user a command failed.
///
/// An expired interaction can't carry a follow-up any more, so the apology
/// goes to the channel instead. Everything else is reported with its raw
/// error text.
pub async fn report_failure(ctx: &Context, command: &CommandInteraction, err: &DiscordError) {
    if err.is_interaction_expired() {
        warn!(command = %command.data.name, "Interaction expired before reply: {err}");
        if let Err(e) = command
            .channel_id
            .say(&ctx.http, messages::INTERACTION_EXPIRED)
            .await
        {
            warn!("Could not post expiry notice: {e}");
        }
        return;
    }

    error!(command = %command.data.name, user_id = %command.user.id, "Command failed: {err}");
    let followup = CreateInteractionResponseFollowup::new()
        .content(messages::unexpected_error(err))
        .ephemeral(true);
    if let Err(e) = command.create_followup(&ctx.http, followup).await {
        error!("Could not report failure to user: {e}");
    }
}
