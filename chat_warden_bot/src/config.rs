use std::collections::HashSet;

use teloxide::types::{ChatId, MessageId, ThreadId};

/// Which chats and topic threads are moderated. Loaded once at
/// startup, immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct ModerationConfig {
    pub monitored_chats: HashSet<ChatId>,
    /// Empty means every thread of a monitored chat is in scope.
    pub monitored_threads: HashSet<ThreadId>,
}

impl ModerationConfig {
    /// Reads `MONITORED_GROUPS` and `MONITORED_TOPICS`, both
    /// comma-separated id lists.
    pub fn from_env() -> Self {
        Self::from_lists(
            &std::env::var("MONITORED_GROUPS").unwrap_or_default(),
            &std::env::var("MONITORED_TOPICS").unwrap_or_default(),
        )
    }

    pub fn from_lists(groups: &str, topics: &str) -> Self {
        let monitored_chats = split_ids::<i64>(groups, "MONITORED_GROUPS")
            .into_iter()
            .map(ChatId)
            .collect();
        let monitored_threads = split_ids::<i32>(topics, "MONITORED_TOPICS")
            .into_iter()
            .map(|id| ThreadId(MessageId(id)))
            .collect();
        Self {
            monitored_chats,
            monitored_threads,
        }
    }
}

/// The Telegram bot token, if set and non-empty.
pub fn bot_token() -> Option<String> {
    std::env::var("BOT_TOKEN")
        .ok()
        .filter(|token| !token.is_empty())
}

/// Port for the HTTP status server. `PORT` environment variable,
/// default 3000.
pub fn status_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(3000)
}

/// Splits a comma-separated id list, skipping (and logging) entries
/// that don't parse. A skipped entry could never match an id from
/// Telegram anyway.
fn split_ids<T: std::str::FromStr>(list: &str, what: &'static str) -> Vec<T> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                log::warn!("Skipping unparsable id {:?} in {}", entry, what);
                None
            }
        })
        .collect()
}
