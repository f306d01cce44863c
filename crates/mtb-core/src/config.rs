use std::env;

use crate::{errors::Error, Result};

const DEFAULT_MESSAGE_LIMIT: usize = 4096;

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub bot_token: String,
    pub app_id: Option<i32>,
    pub app_hash: Option<String>,

    // Identity
    pub bot_username: Option<String>,
    pub owner_username: Option<String>,

    // Telegram limits
    pub message_limit: usize,
}

impl Config {
    /// Load from the process environment, after applying `.env` if present.
    ///
    /// Variables already set in the environment win over `.env`.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!("failed to read .env: {e}"))),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let bot_token = get("TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .ok_or_else(|| {
                Error::Config("TOKEN environment variable is required".to_string())
            })?;
        if !looks_like_bot_token(&bot_token) {
            return Err(Error::Config(
                "TOKEN must look like <bot id>:<secret>".to_string(),
            ));
        }

        let app_id = get("APP_ID")
            .map(|v| {
                v.trim()
                    .parse::<i32>()
                    .map_err(|_| Error::Config(format!("APP_ID must be an integer, got {v:?}")))
            })
            .transpose()?;
        let app_hash = get("API_HASH");

        let bot_username = get("BOT_USERNAME").map(|u| u.trim_start_matches('@').to_string());
        let owner_username = get("OWNER_USERNAME").map(|u| u.trim_start_matches('@').to_string());

        let message_limit = match get("MESSAGE_LIMIT") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    Error::Config(format!("MESSAGE_LIMIT must be a positive integer, got {v:?}"))
                })?,
            None => DEFAULT_MESSAGE_LIMIT,
        };

        Ok(Self {
            bot_token,
            app_id,
            app_hash,
            bot_username,
            owner_username,
            message_limit,
        })
    }
}

fn looks_like_bot_token(token: &str) -> bool {
    let Some((id, secret)) = token.split_once(':') else {
        return false;
    };
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) && !secret.trim().is_empty()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn token_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(load(&[("TOKEN", "   ")]).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(load(&[("TOKEN", "YOUR_BOT_TOKEN")]).is_err());
        assert!(load(&[("TOKEN", "abc:def")]).is_err());
        assert!(load(&[("TOKEN", "123:")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let cfg = load(&[("TOKEN", "123456:ABC-def")]).unwrap();
        assert_eq!(cfg.bot_token, "123456:ABC-def");
        assert_eq!(cfg.app_id, None);
        assert_eq!(cfg.app_hash, None);
        assert_eq!(cfg.bot_username, None);
        assert_eq!(cfg.message_limit, 4096);
    }

    #[test]
    fn telegram_bot_token_is_accepted_as_alias() {
        let cfg = load(&[("TELEGRAM_BOT_TOKEN", "1:x")]).unwrap();
        assert_eq!(cfg.bot_token, "1:x");
    }

    #[test]
    fn app_id_must_be_numeric() {
        assert!(load(&[("TOKEN", "1:x"), ("APP_ID", "YOUR_API_ID")]).is_err());
        let cfg = load(&[("TOKEN", "1:x"), ("APP_ID", "12345"), ("API_HASH", "abc")]).unwrap();
        assert_eq!(cfg.app_id, Some(12345));
        assert_eq!(cfg.app_hash.as_deref(), Some("abc"));
    }

    #[test]
    fn usernames_drop_leading_at() {
        let cfg = load(&[
            ("TOKEN", "1:x"),
            ("BOT_USERNAME", "@mention_bot"),
            ("OWNER_USERNAME", "@owner"),
        ])
        .unwrap();
        assert_eq!(cfg.bot_username.as_deref(), Some("mention_bot"));
        assert_eq!(cfg.owner_username.as_deref(), Some("owner"));
    }

    #[test]
    fn message_limit_must_be_positive() {
        assert!(load(&[("TOKEN", "1:x"), ("MESSAGE_LIMIT", "0")]).is_err());
        assert!(load(&[("TOKEN", "1:x"), ("MESSAGE_LIMIT", "lots")]).is_err());
        let cfg = load(&[("TOKEN", "1:x"), ("MESSAGE_LIMIT", "1000")]).unwrap();
        assert_eq!(cfg.message_limit, 1000);
    }
}
