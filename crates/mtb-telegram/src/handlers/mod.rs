//! Telegram update handlers.
//!
//! Each handler is a small adapter that:
//! - keeps the member roster current
//! - turns the update into an `mtb-core` view
//! - routes commands; mention runs are spawned so `/cancel` is handled while they run

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{ChatMemberUpdated, Message},
};
use tracing::{debug, error};

use mtb_core::{
    commands::{self, BotCommand, IncomingMessage},
    domain::{ChatId, ChatKind, MessageId, MessageRef, UserId},
    mention::run_mention,
};

use crate::router::AppState;

mod members;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    members::observe_message(&state, &msg);

    let Some(incoming) = incoming_message(&msg) else {
        return Ok(());
    };
    let Some(cmd) = state.router.route(&incoming.text) else {
        return Ok(());
    };

    let chat_id = incoming.origin.chat_id.0;
    debug!(chat_id, command = ?cmd, "command received");

    let res = match cmd {
        BotCommand::Start => {
            commands::handle_start(state.client.as_ref(), &state.profile, &incoming).await
        }
        BotCommand::Help => {
            commands::handle_help(state.client.as_ref(), &state.profile, &incoming).await
        }
        BotCommand::Owner => {
            commands::handle_owner(state.client.as_ref(), &state.profile, &incoming).await
        }
        BotCommand::Cancel => {
            commands::handle_cancel(state.client.as_ref(), &state.registry, &incoming)
                .await
                .map(|_| ())
        }
        BotCommand::Mention { filter, text } => {
            let req = incoming.mention_request(filter, &text);
            let state = state.clone();
            tokio::spawn(async move {
                if let Err(e) = run_mention(state.client.as_ref(), &state.registry, req).await {
                    error!(chat_id, filter = filter.as_str(), error = %e, "mention run failed");
                }
            });
            Ok(())
        }
    };

    if let Err(e) = res {
        error!(chat_id, error = %e, "command failed");
    }
    Ok(())
}

pub async fn handle_chat_member(upd: ChatMemberUpdated, state: Arc<AppState>) -> ResponseResult<()> {
    members::apply_member_update(&state, &upd);
    Ok(())
}

pub async fn handle_my_chat_member(
    upd: ChatMemberUpdated,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    members::apply_member_update(&state, &upd);
    Ok(())
}

fn chat_kind(msg: &Message) -> ChatKind {
    if msg.chat.is_private() {
        ChatKind::Private
    } else if msg.chat.is_channel() {
        ChatKind::Channel
    } else if msg.chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Group
    }
}

/// Text of a message, or its caption for media messages.
fn text_or_caption<'a>(text: Option<&'a str>, caption: Option<&'a str>) -> Option<&'a str> {
    text.or(caption)
}

/// Core view of a text (or captioned) message; `None` for anything else.
fn incoming_message(msg: &Message) -> Option<IncomingMessage> {
    let text = text_or_caption(msg.text(), msg.caption())?;
    let reply_text = msg
        .reply_to_message()
        .and_then(|r| text_or_caption(r.text(), r.caption()));

    Some(IncomingMessage {
        origin: MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        },
        chat_kind: chat_kind(msg),
        sender: msg.from().map(|u| UserId(u.id.0 as i64)),
        text: text.to_string(),
        reply_text: reply_text.map(str::to_string),
    })
}
