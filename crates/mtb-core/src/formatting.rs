//! Telegram HTML helpers.

use crate::domain::UserId;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Clickable reference to a user: `<a href="tg://user?id=ID">NAME</a>`.
pub fn mention_link(user_id: UserId, display_name: &str) -> String {
    format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user_id.0,
        escape_html(display_name)
    )
}

/// Public profile URL for a username (leading `@` tolerated).
pub fn username_url(username: &str) -> String {
    format!("https://t.me/{}", username.trim_start_matches('@'))
}
