use std::pin::Pin;

use futures::Stream;

use crate::{domain::Participant, Result};

pub type ParticipantStream = Pin<Box<dyn Stream<Item = Result<Participant>> + Send + 'static>>;

/// Capabilities / limits of a chat platform implementation.
#[derive(Clone, Copy, Debug)]
pub struct ChatCapabilities {
    pub max_message_len: usize,
}

/// Inline keyboard made of URL buttons, one row per inner vec.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<UrlButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlButton {
    pub label: String,
    pub url: String,
}

impl InlineKeyboard {
    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: Vec<UrlButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }
}

/// How to answer the triggering message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseOptions {
    /// Quote the triggering message instead of posting a plain message.
    pub reply: bool,
    pub link_preview: bool,
    pub keyboard: Option<InlineKeyboard>,
}

impl ResponseOptions {
    /// Plain message into the same chat.
    pub fn plain() -> Self {
        Self {
            reply: false,
            link_preview: true,
            keyboard: None,
        }
    }

    /// Quoted reply without link previews.
    pub fn quiet_reply() -> Self {
        Self {
            reply: true,
            link_preview: false,
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        if !keyboard.is_empty() {
            self.keyboard = Some(keyboard);
        }
        self
    }
}
