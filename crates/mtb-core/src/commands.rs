//! Command routing and the small informational commands.
//!
//! The mention commands only get routed here; running them is up to the
//! caller (see [`crate::mention::run_mention`]) so it can spawn them.

use regex::Regex;

use crate::{
    cancellation::CancellationRegistry,
    domain::{ChatKind, MessageRef, ParticipantFilter, UserId},
    formatting::{escape_html, username_url},
    mention::MentionRequest,
    messaging::{
        port::ChatClient,
        types::{InlineKeyboard, ResponseOptions, UrlButton},
    },
    Result,
};

pub const PRIVATE_ONLY_START_TEXT: &str =
    "Hello! This command is meant for private messages. Please send it to me directly!";
pub const PRIVATE_ONLY_OWNER_TEXT: &str = "Use this command in PM";
pub const CANCELLED_TEXT: &str = "Stopped.";
pub const NOTHING_TO_CANCEL_TEXT: &str = "There is no ongoing process.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Owner,
    Cancel,
    Mention {
        filter: ParticipantFilter,
        text: String,
    },
}

/// Matches incoming text against the bot's command patterns.
///
/// Patterns are anchored at the start of the message. Slash commands accept an
/// optional `@botname` suffix.
#[derive(Clone, Debug)]
pub struct CommandRouter {
    start: Regex,
    help: Regex,
    owner: Regex,
    cancel: Regex,
    everyone: Regex,
    admins: Regex,
}

impl CommandRouter {
    pub fn new(bot_username: Option<&str>) -> Result<Self> {
        let suffix = match bot_username.map(|u| u.trim_start_matches('@')) {
            Some(u) if !u.is_empty() => format!("(?:@(?i:{}))?", regex::escape(u)),
            _ => String::new(),
        };

        Ok(Self {
            start: Regex::new(&format!(r"^/start{suffix}$"))?,
            help: Regex::new(&format!(r"^/help{suffix}$"))?,
            owner: Regex::new(&format!(r"^/owner{suffix}$"))?,
            cancel: Regex::new(&format!(r"^/cancel{suffix}$"))?,
            everyone: Regex::new(r"(?s)^@everyone(?:\s|$)(.*)")?,
            admins: Regex::new(&format!(r"(?s)^(?:/admins?{suffix}|@admins?)(?:\s|$)(.*)"))?,
        })
    }

    pub fn route(&self, text: &str) -> Option<BotCommand> {
        let text = text.trim();
        if self.start.is_match(text) {
            return Some(BotCommand::Start);
        }
        if self.help.is_match(text) {
            return Some(BotCommand::Help);
        }
        if self.owner.is_match(text) {
            return Some(BotCommand::Owner);
        }
        if self.cancel.is_match(text) {
            return Some(BotCommand::Cancel);
        }

        let mention = |re: &Regex, filter| {
            re.captures(text).map(|caps| BotCommand::Mention {
                filter,
                text: caps
                    .get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
            })
        };
        mention(&self.everyone, ParticipantFilter::All)
            .or_else(|| mention(&self.admins, ParticipantFilter::Admins))
    }
}

/// Identity of the running bot, used in the informational texts.
#[derive(Clone, Debug)]
pub struct BotProfile {
    pub name: String,
    pub username: String,
    pub owner_username: Option<String>,
}

impl BotProfile {
    pub fn add_to_group_url(&self) -> String {
        format!("{}?startgroup=true", username_url(&self.username))
    }

    fn owner_link(&self) -> Option<String> {
        self.owner_username.as_deref().map(|owner| {
            let owner = owner.trim_start_matches('@');
            format!(
                "<a href=\"{}\">@{}</a>",
                username_url(owner),
                escape_html(owner)
            )
        })
    }
}

/// Platform-neutral view of a message that may carry a command.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub origin: MessageRef,
    pub chat_kind: ChatKind,
    pub sender: Option<UserId>,
    pub text: String,
    pub reply_text: Option<String>,
}

impl IncomingMessage {
    pub fn mention_request(&self, filter: ParticipantFilter, trailing_text: &str) -> MentionRequest {
        MentionRequest {
            origin: self.origin,
            chat_kind: self.chat_kind,
            sender: self.sender,
            filter,
            trailing_text: trailing_text.to_string(),
            reply_text: self.reply_text.clone(),
        }
    }
}

pub fn welcome_text(profile: &BotProfile) -> String {
    format!(
        "👋 <b>Welcome to {}!</b>\n\n\
I'm here to help you manage your Telegram groups more efficiently.\n\
With a few simple commands, you can easily mention all members or just the admins in your group, making announcements a breeze! 📢\n\n\
Here are some things you can do with me:\n\
🔹 <b>@everyone</b> - Mention all members in the group.\n\
🔹 <b>@admins</b> - Mention all admins in the group.\n\
🔹 <b>/cancel</b> - Stop any ongoing mention process.\n\n\
Ready to get started? Add me to your group now!\n",
        escape_html(&profile.name)
    )
}

pub fn help_text(profile: &BotProfile) -> String {
    let mut text = "📚 <b>Help Menu</b> 📚\n\n\
Here are the commands you can use with this bot:\n\n\
🔹 <b>@everyone</b> - Mention all members in the group.\n\
🔹 <b>@admins</b> - Mention all admins in the group.\n\
🔹 <b>/cancel</b> - Cancel the ongoing mention process.\n"
        .to_string();
    if let Some(link) = profile.owner_link() {
        text.push_str(&format!(
            "\nIf you need more assistance or have any questions, feel free to contact {link}.\n"
        ));
    }
    text
}

pub fn owner_text(profile: &BotProfile) -> String {
    let Some(link) = profile.owner_link() else {
        return format!(
            "<b>{}</b> has no owner contact configured.",
            escape_html(&profile.name)
        );
    };
    format!(
        "👋 <b>Meet the owner</b>\n\n\
{link} created and runs this bot to help streamline group management on Telegram, \
and is open to suggestions and feedback.\n\n\
📬 <b>Contact</b>: {link}\n\n\
Feel free to reach out if you have any questions, suggestions, or just want to say hi!"
    )
}

pub async fn handle_start(
    client: &dyn ChatClient,
    profile: &BotProfile,
    msg: &IncomingMessage,
) -> Result<()> {
    if !msg.chat_kind.is_private() {
        client
            .respond(msg.origin, PRIVATE_ONLY_START_TEXT, ResponseOptions::plain())
            .await?;
        return Ok(());
    }

    let mut buttons = vec![UrlButton {
        label: "Add me to your group".to_string(),
        url: profile.add_to_group_url(),
    }];
    if let Some(owner) = profile.owner_username.as_deref() {
        buttons.push(UrlButton {
            label: "Owner".to_string(),
            url: username_url(owner),
        });
    }

    client
        .respond(
            msg.origin,
            &welcome_text(profile),
            ResponseOptions::quiet_reply().with_keyboard(InlineKeyboard::one_per_row(buttons)),
        )
        .await?;
    Ok(())
}

pub async fn handle_help(
    client: &dyn ChatClient,
    profile: &BotProfile,
    msg: &IncomingMessage,
) -> Result<()> {
    client
        .respond(msg.origin, &help_text(profile), ResponseOptions::quiet_reply())
        .await?;
    Ok(())
}

pub async fn handle_owner(
    client: &dyn ChatClient,
    profile: &BotProfile,
    msg: &IncomingMessage,
) -> Result<()> {
    if !msg.chat_kind.is_private() {
        client
            .respond(msg.origin, PRIVATE_ONLY_OWNER_TEXT, ResponseOptions::plain())
            .await?;
        return Ok(());
    }
    client
        .respond(msg.origin, &owner_text(profile), ResponseOptions::quiet_reply())
        .await?;
    Ok(())
}

/// Stop the mention runs of the message's chat. Returns whether one was running.
pub async fn handle_cancel(
    client: &dyn ChatClient,
    registry: &CancellationRegistry,
    msg: &IncomingMessage,
) -> Result<bool> {
    let chat_id = msg.origin.chat_id;
    if !registry.is_marked(chat_id) {
        client
            .respond(msg.origin, NOTHING_TO_CANCEL_TEXT, ResponseOptions::plain())
            .await?;
        return Ok(false);
    }
    registry.unmark(chat_id);
    client
        .respond(msg.origin, CANCELLED_TEXT, ResponseOptions::plain())
        .await?;
    Ok(true)
}
