//! Source code for Chat Warden Bot, a phrase-based moderation bot
//! for Telegram group chats with topics.

/// Various types used throughout.
mod types;

/// Static phrase tables the moderator matches against.
mod phrases;

/// Environment-provided configuration.
mod config;

/// The moderation decision engine.
mod moderation;

/// Functions that handle events from Telegram.
mod handlers;

/// Read-only HTTP status endpoints.
mod status;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;
