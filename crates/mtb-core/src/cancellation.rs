//! Process-wide record of chats with a mention run in flight.
//!
//! Presence of a chat is the "keep going" signal: runs check their own token
//! once per enumerated participant and stop as soon as it is cancelled.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard,
    },
};

use tokio_util::sync::CancellationToken;

use crate::domain::ChatId;

/// Handle for one marked run. Dropping it does not unmark the chat; pass it
/// back to [`CancellationRegistry::release`] when the run ends.
#[derive(Debug)]
pub struct MentionTicket {
    chat_id: ChatId,
    generation: u64,
    token: CancellationToken,
}

impl MentionTicket {
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug, Default)]
pub struct CancellationRegistry {
    next_generation: AtomicU64,
    runs: Mutex<HashMap<ChatId, Vec<(u64, CancellationToken)>>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<ChatId, Vec<(u64, CancellationToken)>>> {
        // Every critical section is a single map operation.
        self.runs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new run for `chat_id`.
    ///
    /// Concurrent runs in the same chat each get their own ticket.
    pub fn mark(&self, chat_id: ChatId) -> MentionTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.runs()
            .entry(chat_id)
            .or_default()
            .push((generation, token.clone()));
        MentionTicket {
            chat_id,
            generation,
            token,
        }
    }

    /// Cancel every run in `chat_id`. Returns whether anything was marked.
    pub fn unmark(&self, chat_id: ChatId) -> bool {
        let Some(runs) = self.runs().remove(&chat_id) else {
            return false;
        };
        for (_, token) in &runs {
            token.cancel();
        }
        !runs.is_empty()
    }

    pub fn is_marked(&self, chat_id: ChatId) -> bool {
        self.runs()
            .get(&chat_id)
            .is_some_and(|runs| !runs.is_empty())
    }

    /// Remove the entry of a finished run. Other runs in the chat stay marked.
    pub fn release(&self, ticket: &MentionTicket) {
        let mut runs = self.runs();
        let Some(entries) = runs.get_mut(&ticket.chat_id) else {
            return;
        };
        entries.retain(|(generation, _)| *generation != ticket.generation);
        if entries.is_empty() {
            runs.remove(&ticket.chat_id);
        }
    }
}
