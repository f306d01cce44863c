//! Telegram adapter (teloxide).
//!
//! This crate implements the `mtb-core` ChatClient port over the Telegram Bot API.

use std::{collections::HashSet, future::Future, sync::Arc};

use async_trait::async_trait;
use futures::{stream, StreamExt};
use teloxide::{
    prelude::*,
    types::{ChatMemberKind, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, User},
    ApiError, RequestError,
};

pub mod handlers;
pub mod router;

use mtb_core::{
    domain::{ChatId, MessageId, MessageRef, Participant, ParticipantFilter, ParticipantRole, UserId},
    errors::Error,
    messaging::{
        port::ChatClient,
        types::{ChatCapabilities, InlineKeyboard, ParticipantStream, ResponseOptions},
    },
    roster::MemberRoster,
    Result,
};

#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
    roster: Arc<MemberRoster>,
    max_message_len: usize,
}

impl TelegramClient {
    pub fn new(bot: Bot, roster: Arc<MemberRoster>, max_message_len: usize) -> Self {
        Self {
            bot,
            roster,
            max_message_len,
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn message_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

pub(crate) fn participant_from_user(user: &User) -> Participant {
    Participant {
        id: UserId(user.id.0 as i64),
        display_name: user.first_name.clone(),
        is_bot: user.is_bot,
    }
}

/// Role of a membership record; `None` for anyone not currently in the chat.
pub(crate) fn role_of(kind: &ChatMemberKind) -> Option<ParticipantRole> {
    match kind {
        ChatMemberKind::Owner(_) => Some(ParticipantRole::Owner),
        ChatMemberKind::Administrator(_) => Some(ParticipantRole::Administrator),
        ChatMemberKind::Member => Some(ParticipantRole::Member),
        ChatMemberKind::Restricted(r) if r.is_member => Some(ParticipantRole::Restricted),
        ChatMemberKind::Restricted(_) | ChatMemberKind::Left | ChatMemberKind::Banned(_) => None,
    }
}

fn keyboard_markup(keyboard: InlineKeyboard) -> Result<InlineKeyboardMarkup> {
    let rows = keyboard
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|b| {
                    let url = b
                        .url
                        .parse::<reqwest::Url>()
                        .map_err(|e| Error::External(format!("invalid button url {}: {e}", b.url)))?;
                    Ok(InlineKeyboardButton::url(b.label, url))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

async fn role_lookup(
    bot: &Bot,
    chat_id: ChatId,
    user_id: UserId,
) -> Result<Option<(ParticipantRole, Participant)>> {
    let Ok(raw_user) = u64::try_from(user_id.0) else {
        return Ok(None);
    };
    match bot
        .get_chat_member(
            TelegramClient::tg_chat(chat_id),
            teloxide::types::UserId(raw_user),
        )
        .await
    {
        Ok(member) => Ok(role_of(&member.kind).map(|role| (role, participant_from_user(&member.user)))),
        Err(RequestError::Api(ApiError::UserNotFound)) => Ok(None),
        Err(e) => Err(TelegramClient::map_err(e)),
    }
}

/// Admins first, then every other roster member that `lookup` still finds in
/// the chat. Members `lookup` no longer finds are skipped and dropped from the
/// roster; present ones get their entry refreshed.
pub(crate) fn admins_then_roster<F, Fut>(
    admins: Vec<Participant>,
    roster: Arc<MemberRoster>,
    chat_id: ChatId,
    lookup: F,
) -> ParticipantStream
where
    F: Fn(UserId) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Option<Participant>>> + Send + 'static,
{
    let admin_ids: HashSet<UserId> = admins.iter().map(|p| p.id).collect();
    let others: Vec<Participant> = roster
        .snapshot(chat_id)
        .into_iter()
        .filter(|p| !admin_ids.contains(&p.id))
        .collect();

    let verified = stream::iter(others)
        .then(move |known| {
            let roster = roster.clone();
            let check = lookup(known.id);
            async move {
                match check.await? {
                    Some(fresh) => {
                        roster.observe(chat_id, fresh.clone());
                        Ok::<_, Error>(Some(fresh))
                    }
                    None => {
                        roster.forget(chat_id, known.id);
                        Ok(None)
                    }
                }
            }
        })
        .filter_map(|res| async move { res.transpose() });

    Box::pin(stream::iter(admins.into_iter().map(Ok::<_, Error>)).chain(verified))
}

#[async_trait]
impl ChatClient for TelegramClient {
    fn capabilities(&self) -> ChatCapabilities {
        ChatCapabilities {
            max_message_len: self.max_message_len,
        }
    }

    async fn participant_role(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<Option<ParticipantRole>> {
        Ok(role_lookup(&self.bot, chat_id, user_id)
            .await?
            .map(|(role, _)| role))
    }

    async fn participants(
        &self,
        chat_id: ChatId,
        filter: ParticipantFilter,
    ) -> Result<ParticipantStream> {
        let admins: Vec<Participant> = self
            .bot
            .get_chat_administrators(Self::tg_chat(chat_id))
            .await
            .map_err(Self::map_err)?
            .iter()
            .map(|m| participant_from_user(&m.user))
            .collect();

        if filter == ParticipantFilter::Admins {
            return Ok(Box::pin(stream::iter(
                admins.into_iter().map(Ok::<_, Error>),
            )));
        }

        let bot = self.bot.clone();
        Ok(admins_then_roster(
            admins,
            self.roster.clone(),
            chat_id,
            move |user_id| {
                let bot = bot.clone();
                async move {
                    Ok::<_, Error>(role_lookup(&bot, chat_id, user_id)
                        .await?
                        .map(|(_, participant)| participant))
                }
            },
        ))
    }

    async fn send_message(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(Self::tg_chat(chat_id), html.to_string())
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(true)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn respond(
        &self,
        origin: MessageRef,
        html: &str,
        options: ResponseOptions,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(origin.chat_id), html.to_string())
            .parse_mode(ParseMode::Html);
        if options.reply {
            req = req.reply_to_message_id(Self::tg_msg_id(origin.message_id));
        }
        if !options.link_preview {
            req = req.disable_web_page_preview(true);
        }
        if let Some(keyboard) = options.keyboard {
            req = req.reply_markup(keyboard_markup(keyboard)?);
        }

        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::message_ref(origin.chat_id, &msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtb_core::messaging::types::UrlButton;
    use serde_json::json;
    use teloxide::types::ChatMember;

    fn human(id: i64, name: &str) -> Participant {
        Participant {
            id: UserId(id),
            display_name: name.to_string(),
            is_bot: false,
        }
    }

    /// Membership kind from a Bot API `ChatMember` payload.
    fn member_kind(mut payload: serde_json::Value) -> ChatMemberKind {
        payload["user"] = json!({ "id": 7, "is_bot": false, "first_name": "Ann" });
        serde_json::from_value::<ChatMember>(payload).unwrap().kind
    }

    fn restricted(is_member: bool) -> ChatMemberKind {
        member_kind(json!({
            "status": "restricted",
            "is_member": is_member,
            "until_date": 0,
            "can_send_messages": false,
            "can_send_media_messages": false,
            "can_send_polls": false,
            "can_send_other_messages": false,
            "can_add_web_page_previews": false,
            "can_change_info": false,
            "can_invite_users": false,
            "can_pin_messages": false,
            "can_manage_topics": false
        }))
    }

    #[test]
    fn membership_kinds_map_to_roles() {
        let owner = member_kind(json!({ "status": "creator", "is_anonymous": false }));
        let admin = member_kind(json!({
            "status": "administrator",
            "can_be_edited": false,
            "is_anonymous": false,
            "can_manage_chat": true,
            "can_delete_messages": true,
            "can_manage_video_chats": false,
            "can_restrict_members": true,
            "can_promote_members": false,
            "can_change_info": false,
            "can_invite_users": true,
            "can_post_messages": false,
            "can_edit_messages": false,
            "can_pin_messages": true,
            "can_manage_topics": false
        }));
        let banned = member_kind(json!({ "status": "kicked", "until_date": 0 }));

        assert_eq!(role_of(&owner), Some(ParticipantRole::Owner));
        assert_eq!(role_of(&admin), Some(ParticipantRole::Administrator));
        assert_eq!(role_of(&ChatMemberKind::Member), Some(ParticipantRole::Member));
        assert_eq!(role_of(&restricted(true)), Some(ParticipantRole::Restricted));
        assert_eq!(role_of(&restricted(false)), None);
        assert_eq!(role_of(&ChatMemberKind::Left), None);
        assert_eq!(role_of(&banned), None);
    }

    #[tokio::test]
    async fn admins_come_first_and_are_not_repeated() {
        let chat = ChatId(-100);
        let roster = Arc::new(MemberRoster::new());
        roster.observe(chat, human(2, "Bob"));
        roster.observe(chat, human(1, "Ann"));
        roster.observe(chat, human(3, "Cy"));

        let stream = admins_then_roster(
            vec![human(1, "Ann")],
            roster,
            chat,
            |id: UserId| async move { Ok::<_, Error>(Some(human(id.0, "member"))) },
        );
        let ids: Vec<i64> = stream.map(|p| p.unwrap().id.0).collect().await;

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn departed_members_are_skipped_and_forgotten() {
        let chat = ChatId(-100);
        let roster = Arc::new(MemberRoster::new());
        roster.observe(chat, human(2, "Bob"));
        roster.observe(chat, human(3, "Cy"));

        let stream = admins_then_roster(
            vec![human(1, "Ann")],
            roster.clone(),
            chat,
            |id: UserId| async move {
                Ok::<_, Error>((id.0 != 2).then(|| human(id.0, "Cyrus")))
            },
        );
        let seen: Vec<Participant> = stream.map(|p| p.unwrap()).collect().await;

        let ids: Vec<i64> = seen.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(seen[1].display_name, "Cyrus");

        let left: Vec<(i64, String)> = roster
            .snapshot(chat)
            .into_iter()
            .map(|p| (p.id.0, p.display_name))
            .collect();
        assert_eq!(left, vec![(3, "Cyrus".to_string())]);
    }

    #[tokio::test]
    async fn lookup_errors_reach_the_caller() {
        let chat = ChatId(-100);
        let roster = Arc::new(MemberRoster::new());
        roster.observe(chat, human(2, "Bob"));

        let stream = admins_then_roster(
            vec![human(1, "Ann")],
            roster.clone(),
            chat,
            |_: UserId| async move {
                Err::<Option<Participant>, _>(Error::External("telegram error: timeout".to_string()))
            },
        );
        let items: Vec<Result<Participant>> = stream.collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().id, UserId(1));
        assert!(items[1].is_err());
        // A failed check is not a departure.
        assert_eq!(roster.snapshot(chat).len(), 1);
    }

    #[tokio::test]
    async fn empty_roster_yields_only_admins() {
        let stream = admins_then_roster(
            vec![human(1, "Ann"), human(4, "Dee")],
            Arc::new(MemberRoster::new()),
            ChatId(-100),
            |id: UserId| async move { Ok::<_, Error>(Some(human(id.0, "x"))) },
        );
        let ids: Vec<i64> = stream.map(|p| p.unwrap().id.0).collect().await;
        assert_eq!(ids, vec![1, 4]);
    }
    #[test]
    fn keyboard_rows_are_preserved() {
        let kb = InlineKeyboard::one_per_row(vec![
            UrlButton {
                label: "Add me to your group".to_string(),
                url: "https://t.me/mention_bot?startgroup=true".to_string(),
            },
            UrlButton {
                label: "Owner".to_string(),
                url: "https://t.me/owner".to_string(),
            },
        ]);
        let markup = keyboard_markup(kb).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "Add me to your group");
    }

    #[test]
    fn invalid_button_url_is_an_error() {
        let kb = InlineKeyboard::one_per_row(vec![UrlButton {
            label: "x".to_string(),
            url: "not a url".to_string(),
        }]);
        assert!(keyboard_markup(kb).is_err());
    }
}
