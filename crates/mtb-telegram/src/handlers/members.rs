use teloxide::types::{ChatMemberUpdated, Message};
use tracing::debug;

use mtb_core::{
    domain::{ChatId, Participant, UserId},
    roster::MemberRoster,
};

use crate::router::AppState;
use crate::{participant_from_user, role_of};

/// Record everyone a group message tells us about.
pub(super) fn observe_message(state: &AppState, msg: &Message) {
    if msg.chat.is_private() {
        return;
    }
    let chat_id = ChatId(msg.chat.id.0);

    let joined = msg
        .from()
        .into_iter()
        .chain(msg.new_chat_members().into_iter().flatten());
    for user in joined {
        record_membership(&state.roster, state.me, chat_id, participant_from_user(user), true);
    }
    if let Some(user) = msg.left_chat_member() {
        record_membership(&state.roster, state.me, chat_id, participant_from_user(user), false);
    }
}

/// Membership changes (joins, promotions, leaves, bans).
pub(super) fn apply_member_update(state: &AppState, upd: &ChatMemberUpdated) {
    let chat_id = ChatId(upd.chat.id.0);
    let member = &upd.new_chat_member;
    let p = participant_from_user(&member.user);
    let present = role_of(&member.kind).is_some();

    debug!(chat_id = chat_id.0, user_id = p.id.0, present, "member update");

    record_membership(&state.roster, state.me, chat_id, p, present);
}

/// The bot itself leaving drops the whole chat.
fn record_membership(
    roster: &MemberRoster,
    me: UserId,
    chat_id: ChatId,
    participant: Participant,
    present: bool,
) {
    match (present, participant.id == me) {
        (true, _) => roster.observe(chat_id, participant),
        (false, true) => roster.forget_chat(chat_id),
        (false, false) => {
            roster.forget(chat_id, participant.id);
        }
    }
}
