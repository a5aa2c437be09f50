use std::sync::Arc;

use teloxide::{dptree::deps, prelude::*};

use crate::{
    config::{self, ModerationConfig},
    handlers::{generate_bot_commands, handle_message},
    moderation::Moderator,
    status,
};

/// # Panics
///
/// Panics if `BOT_TOKEN` is not set.
pub async fn entry() {
    log::info!("ASYNC WOOOO");
    let token = config::bot_token().expect("BOT_TOKEN is not set!");

    let bot = Bot::new(token);

    bot.set_my_commands(generate_bot_commands())
        .await
        .expect("Failed to set bot commands!");

    let moderation_config = ModerationConfig::from_env();
    log::info!("Monitoring chats: {:?}", moderation_config.monitored_chats);
    if moderation_config.monitored_threads.is_empty() {
        log::info!("Monitoring all threads in those chats");
    } else {
        log::info!("Monitoring threads: {:?}", moderation_config.monitored_threads);
    }

    let moderator = Arc::new(Moderator::new(moderation_config));

    tokio::spawn(status::serve(moderator.clone(), config::status_port()));

    log::info!("Creating the handler...");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_edited_message().endpoint(handle_message));

    log::info!("Dispatching the dispatcher!");

    Dispatcher::builder(bot, handler)
        .default_handler(|_| async {})
        .dependencies(deps![moderator])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("it appears we have been bonked.");
}
