//! Fake `ChatClient` shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use futures::{stream, StreamExt};

use crate::{
    cancellation::CancellationRegistry,
    domain::{
        ChatId, MessageId, MessageRef, Participant, ParticipantFilter, ParticipantRole, UserId,
    },
    errors::Error,
    messaging::{
        port::ChatClient,
        types::{ChatCapabilities, ParticipantStream, ResponseOptions},
    },
    Result,
};

pub fn human(id: i64, name: &str) -> Participant {
    Participant {
        id: UserId(id),
        display_name: name.to_string(),
        is_bot: false,
    }
}

pub fn bot(id: i64, name: &str) -> Participant {
    Participant {
        id: UserId(id),
        display_name: name.to_string(),
        is_bot: true,
    }
}

#[derive(Default)]
pub struct FakeChatClient {
    roles: HashMap<UserId, ParticipantRole>,
    members: Vec<Participant>,
    max_message_len: usize,
    fail_role_lookup: bool,
    fail_sends: bool,
    /// Unmark the chat right before yielding the participant at this index.
    cancel_at: Option<(usize, Arc<CancellationRegistry>)>,

    pub participant_calls: Mutex<Vec<(ChatId, ParticipantFilter)>>,
    pub yielded: Arc<AtomicUsize>,
    pub sends: Mutex<Vec<(ChatId, String)>>,
    pub responses: Mutex<Vec<(MessageRef, String, ResponseOptions)>>,
}

impl FakeChatClient {
    pub fn new() -> Self {
        Self {
            max_message_len: 4096,
            ..Default::default()
        }
    }

    pub fn with_role(mut self, user_id: UserId, role: ParticipantRole) -> Self {
        self.roles.insert(user_id, role);
        self
    }

    pub fn with_members(mut self, members: Vec<Participant>) -> Self {
        self.members = members;
        self
    }

    pub fn with_max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len;
        self
    }

    pub fn failing_role_lookup(mut self) -> Self {
        self.fail_role_lookup = true;
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn cancel_at(mut self, index: usize, registry: Arc<CancellationRegistry>) -> Self {
        self.cancel_at = Some((index, registry));
        self
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn response_texts(&self) -> Vec<String> {
        self.responses
            .lock()
            .unwrap()
            .iter()
            .map(|(_, t, _)| t.clone())
            .collect()
    }
}

#[async_trait]
impl ChatClient for FakeChatClient {
    fn capabilities(&self) -> ChatCapabilities {
        ChatCapabilities {
            max_message_len: self.max_message_len,
        }
    }

    async fn participant_role(
        &self,
        _chat_id: ChatId,
        user_id: UserId,
    ) -> Result<Option<ParticipantRole>> {
        if self.fail_role_lookup {
            return Err(Error::External("role lookup failed".to_string()));
        }
        Ok(self.roles.get(&user_id).copied())
    }

    async fn participants(
        &self,
        chat_id: ChatId,
        filter: ParticipantFilter,
    ) -> Result<ParticipantStream> {
        self.participant_calls
            .lock()
            .unwrap()
            .push((chat_id, filter));

        let items: Vec<Participant> = self
            .members
            .iter()
            .filter(|p| match filter {
                ParticipantFilter::All => true,
                ParticipantFilter::Admins => self
                    .roles
                    .get(&p.id)
                    .is_some_and(|r| r.is_privileged()),
            })
            .cloned()
            .collect();

        let cancel_at = self.cancel_at.clone();
        let yielded = self.yielded.clone();
        let s = stream::iter(items.into_iter().enumerate()).map(move |(idx, p)| {
            if let Some((at, registry)) = &cancel_at {
                if idx == *at {
                    registry.unmark(chat_id);
                }
            }
            yielded.fetch_add(1, Ordering::SeqCst);
            Ok(p)
        });
        Ok(Box::pin(s))
    }

    async fn send_message(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        if self.fail_sends {
            return Err(Error::External("send failed".to_string()));
        }
        let mut sends = self.sends.lock().unwrap();
        sends.push((chat_id, html.to_string()));
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(sends.len() as i32),
        })
    }

    async fn respond(
        &self,
        origin: MessageRef,
        html: &str,
        options: ResponseOptions,
    ) -> Result<MessageRef> {
        let mut responses = self.responses.lock().unwrap();
        responses.push((origin, html.to_string(), options));
        Ok(MessageRef {
            chat_id: origin.chat_id,
            message_id: MessageId(1000 + responses.len() as i32),
        })
    }
}
