/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_private(self) -> bool {
        matches!(self, ChatKind::Private)
    }
}

/// One member of a chat as reported by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
    pub is_bot: bool,
}

/// Membership record of a user who is currently in the chat.
///
/// Users that left, were banned or never joined have no role; ports report
/// them as `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipantRole {
    Owner,
    Administrator,
    Member,
    Restricted,
}

impl ParticipantRole {
    pub fn is_privileged(self) -> bool {
        matches!(self, ParticipantRole::Owner | ParticipantRole::Administrator)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipantFilter {
    All,
    Admins,
}

impl ParticipantFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantFilter::All => "all",
            ParticipantFilter::Admins => "admins",
        }
    }
}
