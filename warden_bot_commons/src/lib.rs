//! Common boilerplate for the warden bots: logging and runtime
//! bootstrap, plus a few teloxide helpers.

use std::future::Future;

use teloxide::{
    prelude::*,
    types::{ChatMember, Message},
    RequestError,
};

/// Initialize logging and start the `closure` in an async runtime.
/// Logging is enabled by default on level `info` unless overridden
/// by environment variable `RUST_LOG`. This uses the crate
/// [pretty_env_logger][] internally, see its documentation for more details.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
pub fn start_everything(closure: impl Future<Output = ()>) {
    let log_level = std::env::var_os("RUST_LOG")
        .unwrap_or_else(|| std::ffi::OsString::from("info"))
        .into_string()
        .unwrap_or_else(|_| String::from("info"));

    // The journal timestamps lines on its own.
    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&log_level);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }

    log::info!("hi");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(closure);
}

/// Message methods that teloxide doesn't have.
pub trait MessageStuff {
    /// Text of the message, or its caption if it's a media message.
    fn text_full(&self) -> Option<&str>;
}

impl MessageStuff for Message {
    fn text_full(&self) -> Option<&str> {
        self.text().or_else(|| self.caption())
    }
}

/// Find out if a user of this ID counts as privileged in the specified
/// chat, i.e. is an administrator or the owner of it.
pub async fn is_privileged_in(
    bot: &Bot,
    chat: ChatId,
    user: UserId,
) -> Result<bool, RequestError> {
    let ChatMember { kind, .. } = bot.get_chat_member(chat, user).await?;
    Ok(kind.is_privileged())
}
