use std::sync::Arc;

use teloxide::{
    prelude::*,
    sugar::request::RequestReplyExt,
    types::{BotCommand, Me},
    RequestError,
};

use warden_bot_commons::is_privileged_in;

use crate::{
    moderation::{Decision, DeleteReason, Moderator},
    types::InboundMessage,
};

static PRIVATE_NOTICE: &str = "⚠️ Ваше сообщение в группе было удалено \
    за использование запрещенных фраз. Пожалуйста, соблюдайте правила группы.";

pub fn generate_bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("warnings", "Показать предупреждения пользователя по его ID."),
        BotCommand::new("blacklist", "Показать черный список."),
        BotCommand::new("unban", "Разблокировать пользователя и сбросить его предупреждения."),
    ]
}

/// Handles both new and edited messages; an edit can sneak in a phrase
/// the original didn't have.
pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    moderator: Arc<Moderator>,
) -> Result<(), RequestError> {
    let Some(inbound) = InboundMessage::from_message(&message) else {
        return Ok(());
    };

    // Nothing below would act on this message anyway; don't burn an
    // API call per message in every chat the bot merely inhabits.
    if !needs_role_lookup(&moderator, &inbound) {
        return Ok(());
    }

    let is_privileged = match is_privileged_in(&bot, inbound.chat_id, inbound.sender_id).await {
        Ok(privileged) => privileged,
        Err(e) => {
            // Couldn't find out; moderate them like a regular user.
            log::warn!("Failed to check status of user {}: {}", inbound.sender_id, e);
            false
        }
    };

    if is_privileged && handle_admin_command(&bot, &me, &message, &moderator).await? {
        return Ok(());
    }

    match moderator.evaluate(&inbound, is_privileged) {
        Decision::Ignore => (),
        Decision::DeleteSilently(reason) => {
            delete_silently(&bot, &inbound, reason).await;
        }
        Decision::DeleteWithWarning { count, username } => {
            delete_for_moderation(&bot, &inbound).await;

            let ordinal = match count {
                1 => "первое",
                2 => "второе",
                _ => "третье",
            };
            bot.send_message(
                inbound.chat_id,
                format!(
                    "⚠️ {}, по правилам это запрещено. Вам {} предупреждение. ({}/3)",
                    username, ordinal, count
                ),
            )
            .reply_to(inbound.message_id)
            .await?;

            log::info!(
                "User {} got warning {}/3 in chat {}",
                inbound.sender_id,
                count,
                inbound.chat_id
            );
        }
        Decision::DeleteAndBlacklist { username } => {
            delete_for_moderation(&bot, &inbound).await;

            bot.send_message(
                inbound.chat_id,
                format!(
                    "❌ {}, вы получили 3 предупреждения и добавлены в черный список. \
                     Ваши сообщения будут автоматически удаляться.",
                    username
                ),
            )
            .reply_to(inbound.message_id)
            .await?;

            log::info!("User {} is now blacklisted", inbound.sender_id);
        }
    }

    Ok(())
}

/// Deletes a message nobody gets warned for: blacklist hits and
/// forbidden phrases. The private heads-up to the sender is
/// best-effort; they may have never started the bot.
async fn delete_silently(bot: &Bot, inbound: &InboundMessage, reason: DeleteReason) {
    if let Err(e) = bot.delete_message(inbound.chat_id, inbound.message_id).await {
        log::error!(
            "Failed to delete message {} in chat {}: {}",
            inbound.message_id.0,
            inbound.chat_id,
            e
        );
        return;
    }

    match reason {
        DeleteReason::Blacklisted => {
            log::info!("Deleted a message from blacklisted user {}", inbound.sender_id);
        }
        DeleteReason::ForbiddenPhrase => {
            log::info!(
                "Deleted a message with a forbidden phrase from user {}: {:?}",
                inbound.sender_id,
                inbound.text
            );
            if let Err(e) = bot.send_message(inbound.sender_id, PRIVATE_NOTICE).await {
                log::debug!("Could not send a private notice to {}: {}", inbound.sender_id, e);
            }
        }
    }
}

/// Deletes a message that a chat-visible notice will follow. A failed
/// deletion is logged and that's it: the warning already counted.
async fn delete_for_moderation(bot: &Bot, inbound: &InboundMessage) {
    if let Err(e) = bot.delete_message(inbound.chat_id, inbound.message_id).await {
        log::error!(
            "Failed to delete message {} in chat {}: {}",
            inbound.message_id.0,
            inbound.chat_id,
            e
        );
    }
}

/// Admin command verbs. Returns `Ok(true)` if the message was one of
/// them. The caller has already verified the sender is privileged;
/// commands from anyone else never reach this point.
async fn handle_admin_command(
    bot: &Bot,
    me: &Me,
    message: &Message,
    moderator: &Moderator,
) -> Result<bool, RequestError> {
    let Some(text) = message.text() else {
        return Ok(false);
    };
    if !text.starts_with('/') {
        return Ok(false);
    }

    let mut words = text.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(false);
    };

    // Trim the bot's username from the command and convert to lowercase.
    let username = format!("@{}", me.username());
    let command = command.trim_end_matches(username.as_str()).to_lowercase();

    match command.as_str() {
        "/warnings" => {
            // A missing or non-numeric id silently no-ops.
            let Some(user) = parse_user_id(words.next()) else {
                return Ok(true);
            };
            let count = moderator.warning_count(user);
            bot.send_message(
                message.chat.id,
                format!("Пользователь {} имеет {} предупреждений.", user, count),
            )
            .await?;
            Ok(true)
        }
        "/blacklist" => {
            let blacklist = moderator.blacklist_snapshot();
            let reply = if blacklist.is_empty() {
                "Черный список пуст.".to_string()
            } else {
                let ids = blacklist
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("Черный список ({} пользователей):\n{}", blacklist.len(), ids)
            };
            bot.send_message(message.chat.id, reply).await?;
            Ok(true)
        }
        "/unban" => {
            let Some(user) = parse_user_id(words.next()) else {
                return Ok(true);
            };
            moderator.reset_user(user);
            bot.send_message(
                message.chat.id,
                format!(
                    "Пользователь {} удален из черного списка и его предупреждения сброшены.",
                    user
                ),
            )
            .await?;
            log::info!("User {} was unbanned by an admin", user);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// True if this message could need the sender's role resolved: it is
/// in a moderated chat, or it looks like a command verb (admins may
/// use those from any chat the bot is in).
fn needs_role_lookup(moderator: &Moderator, inbound: &InboundMessage) -> bool {
    moderator.config().monitored_chats.contains(&inbound.chat_id)
        || inbound.text.starts_with('/')
}

fn parse_user_id(word: Option<&str>) -> Option<UserId> {
    word.and_then(|word| word.parse().ok()).map(UserId)
}
