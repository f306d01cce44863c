//! Mention-everyone / mention-admins workflow.
//!
//! One invocation: validate the context, check the caller is an admin, mark
//! the chat, walk the participant list while the run is not cancelled,
//! send the collected mentions in as many messages as needed, release the mark.

use futures::StreamExt;
use tracing::{info, warn};

use crate::{
    authorization::is_user_admin,
    cancellation::{CancellationRegistry, MentionTicket},
    chunking::chunk_at_boundaries,
    domain::{ChatKind, MessageRef, Participant, ParticipantFilter, UserId},
    formatting::{escape_html, mention_link},
    messaging::{port::ChatClient, types::ResponseOptions},
    Result,
};

pub const GROUP_ONLY_TEXT: &str = "This command can only be used in groups or channels.";
pub const EVERYONE_NOT_ADMIN_TEXT: &str = "Only admins can use this command.";
pub const ADMINS_NOT_ADMIN_TEXT: &str = "Only admins can mention.";

/// Everything the workflow needs to know about the triggering message.
#[derive(Clone, Debug)]
pub struct MentionRequest {
    pub origin: MessageRef,
    pub chat_kind: ChatKind,
    pub sender: Option<UserId>,
    pub filter: ParticipantFilter,
    /// Text following the trigger token in the same message.
    pub trailing_text: String,
    /// Text (or caption) of the message the trigger replies to.
    pub reply_text: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    PrivateChat,
    NotAdmin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MentionReport {
    pub mentioned: usize,
    pub chunks: usize,
    pub cancelled: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MentionOutcome {
    Rejected(Rejection),
    Completed(MentionReport),
}

/// Accumulated mention tokens of one run.
///
/// Each token is followed by a single space; the end of every token is kept as
/// a preferred split point.
#[derive(Debug, Default)]
pub struct MentionBuffer {
    text: String,
    boundaries: Vec<usize>,
}

impl MentionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, participant: &Participant) {
        self.text
            .push_str(&mention_link(participant.id, &participant.display_name));
        self.text.push(' ');
        self.boundaries.push(self.text.len());
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Number of mentioned users.
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    #[cfg(test)]
    fn as_str(&self) -> &str {
        &self.text
    }

    /// Final message (mentions, blank line, `message` if any) split to `max_len`.
    pub fn into_chunks(self, message: &str, max_len: usize) -> Vec<String> {
        let Self {
            mut text,
            mut boundaries,
        } = self;
        if !message.is_empty() {
            text.push_str("\n\n");
            boundaries.push(text.len());
            text.push_str(message);
        }
        chunk_at_boundaries(&text, max_len, &boundaries)
    }
}

/// Text appended after the mentions: trailing text, else the replied-to text
/// as it was sent, else nothing.
pub fn extract_message(trailing_text: &str, reply_text: Option<&str>) -> String {
    let trailing = trailing_text.trim();
    if !trailing.is_empty() {
        return trailing.to_string();
    }
    reply_text.unwrap_or_default().to_string()
}

pub async fn run_mention(
    client: &dyn ChatClient,
    registry: &CancellationRegistry,
    req: MentionRequest,
) -> Result<MentionOutcome> {
    let chat_id = req.origin.chat_id;

    if req.chat_kind.is_private() {
        client
            .respond(req.origin, GROUP_ONLY_TEXT, ResponseOptions::plain())
            .await?;
        return Ok(MentionOutcome::Rejected(Rejection::PrivateChat));
    }

    let authorized = match req.sender {
        Some(user_id) => match is_user_admin(client, chat_id, user_id).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(chat_id = chat_id.0, user_id = user_id.0, error = %e, "admin check failed");
                false
            }
        },
        None => false,
    };
    if !authorized {
        let text = match req.filter {
            ParticipantFilter::All => EVERYONE_NOT_ADMIN_TEXT,
            ParticipantFilter::Admins => ADMINS_NOT_ADMIN_TEXT,
        };
        client
            .respond(req.origin, text, ResponseOptions::plain())
            .await?;
        return Ok(MentionOutcome::Rejected(Rejection::NotAdmin));
    }

    let message = escape_html(&extract_message(
        &req.trailing_text,
        req.reply_text.as_deref(),
    ));

    let ticket = registry.mark(chat_id);
    let result = mention_and_send(client, &ticket, req.filter, &message).await;
    registry.release(&ticket);
    let report = result?;

    info!(
        chat_id = chat_id.0,
        user_id = req.sender.map(|u| u.0),
        filter = req.filter.as_str(),
        mentioned = report.mentioned,
        chunks = report.chunks,
        cancelled = report.cancelled,
        "mention run finished"
    );

    Ok(MentionOutcome::Completed(report))
}

async fn mention_and_send(
    client: &dyn ChatClient,
    ticket: &MentionTicket,
    filter: ParticipantFilter,
    message: &str,
) -> Result<MentionReport> {
    let chat_id = ticket.chat_id();
    let mut participants = client.participants(chat_id, filter).await?;
    let mut buffer = MentionBuffer::new();
    let mut cancelled = false;

    while let Some(item) = participants.next().await {
        if ticket.is_cancelled() {
            cancelled = true;
            break;
        }
        let participant = item?;
        if participant.is_bot {
            continue;
        }
        buffer.push(&participant);
    }

    if buffer.is_empty() {
        return Ok(MentionReport {
            cancelled,
            ..Default::default()
        });
    }

    let mentioned = buffer.len();
    let chunks = buffer.into_chunks(message, client.capabilities().max_message_len);
    for part in &chunks {
        client.send_message(chat_id, part).await?;
    }

    Ok(MentionReport {
        mentioned,
        chunks: chunks.len(),
        cancelled,
    })
}
