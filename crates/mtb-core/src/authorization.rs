use crate::{
    domain::{ChatId, UserId},
    messaging::port::ChatClient,
    Result,
};

/// Whether `user_id` is the owner or an administrator of `chat_id`.
///
/// A user who is not in the chat at all is simply not an admin; only other
/// platform failures surface as errors.
pub async fn is_user_admin(
    client: &dyn ChatClient,
    chat_id: ChatId,
    user_id: UserId,
) -> Result<bool> {
    let role = client.participant_role(chat_id, user_id).await?;
    Ok(role.is_some_and(|r| r.is_privileged()))
}
