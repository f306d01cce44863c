use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, ParticipantFilter, ParticipantRole, UserId},
    messaging::types::{ChatCapabilities, ParticipantStream, ResponseOptions},
    Result,
};

/// Narrow port over the chat platform.
///
/// Everything the bot needs from Telegram goes through here so the workflows
/// can run against a fake in tests.
#[async_trait]
pub trait ChatClient: Send + Sync {
    fn capabilities(&self) -> ChatCapabilities;

    /// Role of `user_id` in `chat_id`, or `None` when the user is not a participant.
    async fn participant_role(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<Option<ParticipantRole>>;

    /// Lazily enumerate the chat's members. Every poll may hit the network.
    async fn participants(
        &self,
        chat_id: ChatId,
        filter: ParticipantFilter,
    ) -> Result<ParticipantStream>;

    async fn send_message(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Answer the message that triggered a command.
    async fn respond(
        &self,
        origin: MessageRef,
        html: &str,
        options: ResponseOptions,
    ) -> Result<MessageRef>;
}
