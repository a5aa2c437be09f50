use teloxide::types::{ChatId, Message, MessageId, ThreadId, User, UserId};

use warden_bot_commons::MessageStuff;

/// A chat message normalized down to the fields moderation cares about.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub thread_id: Option<ThreadId>,
    pub sender_id: UserId,
    /// Cosmetic only; used to address the sender in chat-visible
    /// notices.
    pub sender_name: String,
    /// Message text or media caption, empty if there's neither.
    pub text: String,
    pub message_id: MessageId,
}

impl InboundMessage {
    /// Returns `None` for messages without an identifiable sender,
    /// such as channel posts and service messages.
    pub fn from_message(message: &Message) -> Option<Self> {
        let sender = message.from.as_ref()?;
        Some(Self {
            chat_id: message.chat.id,
            thread_id: message.thread_id,
            sender_id: sender.id,
            sender_name: display_name(sender),
            text: message.text_full().unwrap_or("").to_string(),
            message_id: message.id,
        })
    }
}

/// Make a string, either a @username or full name, describing the user.
pub fn display_name(user: &User) -> String {
    if let Some(username) = &user.username {
        format!("@{}", username)
    } else {
        user.full_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(username: Option<&str>) -> User {
        let mut raw = json!({
            "id": 42,
            "is_bot": false,
            "first_name": "Иван",
            "last_name": "Иванов",
        });
        if let Some(username) = username {
            raw["username"] = json!(username);
        }
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn display_name_prefers_the_username() {
        assert_eq!(display_name(&user(Some("ivan_v"))), "@ivan_v");
    }

    #[test]
    fn display_name_falls_back_to_the_full_name() {
        assert_eq!(display_name(&user(None)), "Иван Иванов");
    }
}
