//! In-memory record of the members the bot has seen in each chat.
//!
//! The Bot API cannot list a group's members, so the adapter feeds this from
//! incoming updates. Nothing is persisted; a restart starts empty.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use crate::domain::{ChatId, Participant, UserId};

#[derive(Debug, Default)]
pub struct MemberRoster {
    chats: Mutex<HashMap<ChatId, Vec<Participant>>>,
}

impl MemberRoster {
    pub fn new() -> Self {
        Self::default()
    }

    fn chats(&self) -> MutexGuard<'_, HashMap<ChatId, Vec<Participant>>> {
        self.chats.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record `participant` as a member of `chat_id`, refreshing its display name.
    ///
    /// Members keep the position of their first sighting.
    pub fn observe(&self, chat_id: ChatId, participant: Participant) {
        let mut chats = self.chats();
        let members = chats.entry(chat_id).or_default();
        match members.iter_mut().find(|m| m.id == participant.id) {
            Some(existing) => *existing = participant,
            None => members.push(participant),
        }
    }

    /// Drop a user who left or was removed. Returns whether it was known.
    pub fn forget(&self, chat_id: ChatId, user_id: UserId) -> bool {
        let mut chats = self.chats();
        let Some(members) = chats.get_mut(&chat_id) else {
            return false;
        };
        let before = members.len();
        members.retain(|m| m.id != user_id);
        let removed = members.len() != before;
        if members.is_empty() {
            chats.remove(&chat_id);
        }
        removed
    }

    /// Drop everything known about a chat (e.g. the bot itself was removed).
    pub fn forget_chat(&self, chat_id: ChatId) {
        self.chats().remove(&chat_id);
    }

    pub fn snapshot(&self, chat_id: ChatId) -> Vec<Participant> {
        self.chats().get(&chat_id).cloned().unwrap_or_default()
    }

}
