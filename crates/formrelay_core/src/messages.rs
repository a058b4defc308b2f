//! Fixed user-facing texts.

use crate::config::DiscordAppConfig;

/// Discord rejects message content longer than this many characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

pub const URL_SAVED: &str = "Google Form URL saved successfully.";
pub const NO_USER_FOUND: &str = "No user found.";
pub const INTERACTION_EXPIRED: &str =
    "Sorry, that took too long and Discord closed the request. Please try the command again.";

pub fn save_failed(status: u16) -> String {
    format!("Failed to save URL: {status}")
}

pub fn submitted(content: &str) -> String {
    format!("Content successfully submitted: {content}")
}

pub fn submission_failed(status: u16) -> String {
    format!("Submission failed: {status}")
}

pub fn unexpected_error(error: &dyn std::fmt::Display) -> String {
    format!("An error occurred: {error}")
}

/// True when a plain chat message should get the invitation reply.
///
/// The whole message must be "hi" in any case; surrounding text or
/// whitespace does not count.
pub fn is_greeting(content: &str) -> bool {
    content.to_lowercase() == "hi"
}

/// Reply to a greeting: where to add the bot and where to read about it.
pub fn invitation(app: &DiscordAppConfig) -> String {
    format!(
        "add bot : {}\nweb page : {}",
        app.invite_url, app.homepage_url
    )
}

/// Usage manual posted once when the bot joins a new guild.
pub fn onboarding_manual(app: &DiscordAppConfig) -> String {
    format!(
        r#"{invitation}

# Google Forms Discord Bot User Manual

## 1. Add Discord Bot
To begin, you need to add the bot to your Discord server. Use the bot invitation link to invite it to the server of your choice.

## 2. Find Google Form URL and Input Field ID
You will need to locate the URL of the Google Form and the ID of the input field where responses will be submitted. Follow these steps:

1. Access the Google Form you want to use.
2. Open the developer tools in your browser (usually by pressing the F12 key).
3. Navigate to the "Network" tab within the developer tools.
4. Submit a response to the form.
5. Look for the item labeled 'formResponse' in the network activity.
6. In the payload, find the number that follows 'entry.'. This number is the ID of the input field.

## 3. Set Up the Bot
To configure the bot, use the following command in the Discord chat:

`/setting [GoogleFormURL] [InputFieldID]`

### Example:
`/setting https://docs.google.com/forms/d/e/your-form-id/formResponse 1234567`

This will associate your Google Form and the specific input field with the bot.

## 4. Send Messages
Once the setup is complete, you can send messages to the Google Form using the bot with the following command:

`/add [message]`

### Example:
`/add Hello, this is a test message.`

This will submit the message to the specified input field in your Google Form.
"#,
        invitation = invitation(app)
    )
}

/// Cut `text` down to what fits in a single Discord message.
pub fn truncate_for_discord(text: &str) -> String {
    if text.chars().count() <= DISCORD_MESSAGE_LIMIT {
        return text.to_string();
    }
    let mut out: String = text.chars().take(DISCORD_MESSAGE_LIMIT - 1).collect();
    out.push('…');
    out
}
