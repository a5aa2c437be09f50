use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use teloxide::types::UserId;

use crate::{config::ModerationConfig, phrases, types::InboundMessage};

/// Warnings a sender can collect before landing on the blacklist.
pub const WARNING_LIMIT: u32 = 3;

/// Why a message is being deleted without a chat-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    /// The sender is blacklisted; content wasn't even looked at.
    Blacklisted,
    /// The text contains a forbidden phrase.
    ForbiddenPhrase,
}

/// What should happen to a message, as decided by
/// [`Moderator::evaluate`]. The moderator only decides; carrying the
/// decision out is the handlers' job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Leave the message alone.
    Ignore,
    /// Delete the message, post nothing to the chat.
    DeleteSilently(DeleteReason),
    /// Delete the message and post a warning reply naming the sender.
    DeleteWithWarning { count: u32, username: String },
    /// Delete the message, blacklist the sender, post a notice reply.
    DeleteAndBlacklist { username: String },
}

/// Warning counters and the blacklist. In-memory only: a restart
/// forgets everything.
#[derive(Debug, Default)]
struct ModerationState {
    warning_counts: HashMap<UserId, u32>,
    blacklist: HashSet<UserId>,
}

/// Aggregate numbers for the status endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ModerationStats {
    pub total_warnings_issued: u64,
    pub users_with_warnings: usize,
    pub blacklisted_users: usize,
}

/// The moderation decision engine. Performs no I/O and cannot fail;
/// all state mutation happens under one mutex, never held across an
/// await.
pub struct Moderator {
    config: ModerationConfig,
    state: Mutex<ModerationState>,
}

impl Moderator {
    pub fn new(config: ModerationConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ModerationState::default()),
        }
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, ModerationState> {
        // The critical sections never panic midway, so a poisoned
        // lock still holds a usable state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide what to do with a message. Checks run in a fixed order,
    /// first match wins:
    ///
    /// 1. Privileged senders are exempt from everything.
    /// 2. Unmonitored chats are out of scope.
    /// 3. So are unmonitored threads, when a thread list is configured.
    ///    A message with no thread id is not filtered out.
    /// 4. Blacklisted senders get deleted no matter what they wrote.
    /// 5. A forbidden phrase deletes silently, without a warning.
    /// 6. A warnable phrase counts a warning; the third one blacklists.
    pub fn evaluate(&self, msg: &InboundMessage, is_privileged: bool) -> Decision {
        if is_privileged {
            return Decision::Ignore;
        }

        if !self.config.monitored_chats.contains(&msg.chat_id) {
            return Decision::Ignore;
        }

        if !self.config.monitored_threads.is_empty() {
            if let Some(thread_id) = msg.thread_id {
                if !self.config.monitored_threads.contains(&thread_id) {
                    return Decision::Ignore;
                }
            }
        }

        let mut state = self.state();

        if state.blacklist.contains(&msg.sender_id) {
            return Decision::DeleteSilently(DeleteReason::Blacklisted);
        }

        let lowered = msg.text.to_lowercase();

        if phrases::contains_any(&lowered, phrases::FORBIDDEN_PHRASES) {
            return Decision::DeleteSilently(DeleteReason::ForbiddenPhrase);
        }

        if phrases::contains_any(&lowered, phrases::WARNING_PHRASES) {
            let count = {
                let count = state.warning_counts.entry(msg.sender_id).or_insert(0);
                *count += 1;
                *count
            };

            return if count >= WARNING_LIMIT {
                state.blacklist.insert(msg.sender_id);
                Decision::DeleteAndBlacklist {
                    username: msg.sender_name.clone(),
                }
            } else {
                Decision::DeleteWithWarning {
                    count,
                    username: msg.sender_name.clone(),
                }
            };
        }

        Decision::Ignore
    }

    /// How many warnings this user has collected; 0 if none.
    pub fn warning_count(&self, user: UserId) -> u32 {
        self.state()
            .warning_counts
            .get(&user)
            .copied()
            .unwrap_or(0)
    }

    /// The blacklisted users, in no particular order.
    pub fn blacklist_snapshot(&self) -> Vec<UserId> {
        self.state().blacklist.iter().copied().collect()
    }

    /// Forget the user's warnings and blacklist membership, both in
    /// one go. A no-op for unknown users.
    pub fn reset_user(&self, user: UserId) {
        let mut state = self.state();
        state.warning_counts.remove(&user);
        state.blacklist.remove(&user);
    }

    pub fn stats(&self) -> ModerationStats {
        let state = self.state();
        ModerationStats {
            total_warnings_issued: state.warning_counts.values().map(|&c| u64::from(c)).sum(),
            users_with_warnings: state.warning_counts.len(),
            blacklisted_users: state.blacklist.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::{ChatId, MessageId, ThreadId};

    fn moderator(chats: &[i64], threads: &[i32]) -> Moderator {
        Moderator::new(ModerationConfig {
            monitored_chats: chats.iter().copied().map(ChatId).collect(),
            monitored_threads: threads
                .iter()
                .map(|&id| ThreadId(MessageId(id)))
                .collect(),
        })
    }

    fn msg(chat: i64, thread: Option<i32>, sender: u64, text: &str) -> InboundMessage {
        InboundMessage {
            chat_id: ChatId(chat),
            thread_id: thread.map(|id| ThreadId(MessageId(id))),
            sender_id: UserId(sender),
            sender_name: format!("@user{}", sender),
            text: text.to_string(),
            message_id: MessageId(1),
        }
    }

    /// Runs the user through three warnings so they end up blacklisted.
    fn blacklist_via_warnings(moderator: &Moderator, chat: i64, sender: u64) {
        for _ in 0..3 {
            moderator.evaluate(&msg(chat, None, sender, "скинь машинку"), false);
        }
        assert_eq!(moderator.warning_count(UserId(sender)), 3);
    }

    #[test]
    fn privileged_senders_are_exempt() {
        let moderator = moderator(&[-100], &[]);
        blacklist_via_warnings(&moderator, -100, 1);

        // Even a blacklisted sender posting forbidden text is left
        // alone once they are an admin.
        let decision = moderator.evaluate(&msg(-100, None, 1, "пиши в лс"), true);
        assert_eq!(decision, Decision::Ignore);
    }

    #[test]
    fn unmonitored_chats_are_ignored() {
        let moderator = moderator(&[-100], &[]);
        let decision = moderator.evaluate(&msg(-200, None, 1, "пиши в лс"), false);
        assert_eq!(decision, Decision::Ignore);
        assert_eq!(moderator.warning_count(UserId(1)), 0);
    }

    #[test]
    fn clean_messages_are_ignored() {
        let moderator = moderator(&[-100], &[]);
        assert_eq!(
            moderator.evaluate(&msg(-100, None, 1, "добрый день всем"), false),
            Decision::Ignore
        );
        assert_eq!(moderator.evaluate(&msg(-100, None, 1, ""), false), Decision::Ignore);
    }

    #[test]
    fn forbidden_phrase_deletes_silently() {
        let moderator = moderator(&[-100], &[]);
        let decision = moderator.evaluate(&msg(-100, None, 1, "скинь в личку плиз"), false);
        assert_eq!(decision, Decision::DeleteSilently(DeleteReason::ForbiddenPhrase));
        assert_eq!(moderator.warning_count(UserId(1)), 0);
    }

    #[test]
    fn matching_ignores_case() {
        let moderator = moderator(&[-100], &[]);
        assert_eq!(
            moderator.evaluate(&msg(-100, None, 1, "ПИШИ В ЛС"), false),
            Decision::DeleteSilently(DeleteReason::ForbiddenPhrase)
        );
        assert_eq!(
            moderator.evaluate(&msg(-100, None, 2, "где ФаЙлИк? ну, Файл"), false),
            Decision::DeleteWithWarning {
                count: 1,
                username: "@user2".to_string()
            }
        );
    }

    #[test]
    fn forbidden_wins_over_warnable() {
        let moderator = moderator(&[-100], &[]);
        // "машинка" alone would be a warning; "скинь в лс" makes the
        // whole message forbidden instead.
        let decision = moderator.evaluate(&msg(-100, None, 1, "машинка есть, скинь в лс"), false);
        assert_eq!(decision, Decision::DeleteSilently(DeleteReason::ForbiddenPhrase));
        assert_eq!(moderator.warning_count(UserId(1)), 0);
    }

    #[test]
    fn warnings_escalate_to_blacklist() {
        let moderator = moderator(&[-100], &[]);

        assert_eq!(
            moderator.evaluate(&msg(-100, None, 7, "есть машинка?"), false),
            Decision::DeleteWithWarning {
                count: 1,
                username: "@user7".to_string()
            }
        );
        assert_eq!(
            moderator.evaluate(&msg(-100, None, 7, "ну так машинка же"), false),
            Decision::DeleteWithWarning {
                count: 2,
                username: "@user7".to_string()
            }
        );
        assert_eq!(
            moderator.evaluate(&msg(-100, None, 7, "машинка!!"), false),
            Decision::DeleteAndBlacklist {
                username: "@user7".to_string()
            }
        );

        assert_eq!(moderator.warning_count(UserId(7)), 3);
        assert_eq!(moderator.blacklist_snapshot(), vec![UserId(7)]);
    }

    #[test]
    fn blacklisted_senders_are_always_deleted() {
        let moderator = moderator(&[-100], &[]);
        blacklist_via_warnings(&moderator, -100, 7);

        // Any text at all, including perfectly clean text.
        for text in ["hello", "добрый день", "машинка"] {
            assert_eq!(
                moderator.evaluate(&msg(-100, None, 7, text), false),
                Decision::DeleteSilently(DeleteReason::Blacklisted)
            );
        }

        // And none of that touched the counter again.
        assert_eq!(moderator.warning_count(UserId(7)), 3);
    }

    #[test]
    fn reset_clears_count_and_blacklist() {
        let moderator = moderator(&[-100], &[]);
        blacklist_via_warnings(&moderator, -100, 7);

        moderator.reset_user(UserId(7));

        assert!(moderator.blacklist_snapshot().is_empty());
        assert_eq!(moderator.warning_count(UserId(7)), 0);

        // The next warnable message starts a fresh count.
        assert_eq!(
            moderator.evaluate(&msg(-100, None, 7, "машинка"), false),
            Decision::DeleteWithWarning {
                count: 1,
                username: "@user7".to_string()
            }
        );

        // Resetting someone the moderator never saw is fine too.
        moderator.reset_user(UserId(999));
    }

    #[test]
    fn thread_filter_skips_other_threads_but_not_threadless_messages() {
        let moderator = moderator(&[-100], &[5]);

        // Wrong thread: out of scope.
        assert_eq!(
            moderator.evaluate(&msg(-100, Some(6), 1, "машинка"), false),
            Decision::Ignore
        );

        // Right thread: moderated.
        assert_eq!(
            moderator.evaluate(&msg(-100, Some(5), 1, "машинка"), false),
            Decision::DeleteWithWarning {
                count: 1,
                username: "@user1".to_string()
            }
        );

        // No thread id at all: still moderated.
        assert_eq!(
            moderator.evaluate(&msg(-100, None, 1, "машинка"), false),
            Decision::DeleteWithWarning {
                count: 2,
                username: "@user1".to_string()
            }
        );
    }

    #[test]
    fn machinka_escalation_scenario() {
        let moderator = moderator(&[-1001], &[]);

        for expected_count in 1..=2 {
            assert_eq!(
                moderator.evaluate(&msg(-1001, None, 42, "го машинку"), false),
                Decision::DeleteWithWarning {
                    count: expected_count,
                    username: "@user42".to_string()
                }
            );
        }
        assert_eq!(
            moderator.evaluate(&msg(-1001, None, 42, "го машинку"), false),
            Decision::DeleteAndBlacklist {
                username: "@user42".to_string()
            }
        );

        // The fourth message is unrelated and still gets removed.
        assert_eq!(
            moderator.evaluate(&msg(-1001, None, 42, "hello"), false),
            Decision::DeleteSilently(DeleteReason::Blacklisted)
        );
    }

    #[test]
    fn a_poisoned_lock_is_not_fatal() {
        let moderator = std::sync::Arc::new(moderator(&[-100], &[]));
        moderator.evaluate(&msg(-100, None, 7, "машинка"), false);

        // Poison the lock by panicking a thread that holds it.
        let clone = moderator.clone();
        let _ = std::thread::spawn(move || {
            let _guard = clone.state.lock().unwrap();
            panic!("oops");
        })
        .join();

        assert_eq!(moderator.warning_count(UserId(7)), 1);
        assert_eq!(
            moderator.evaluate(&msg(-100, None, 7, "машинка"), false),
            Decision::DeleteWithWarning {
                count: 2,
                username: "@user7".to_string()
            }
        );
    }

    #[test]
    fn stats_add_up() {
        let moderator = moderator(&[-100], &[]);
        blacklist_via_warnings(&moderator, -100, 7);
        moderator.evaluate(&msg(-100, None, 8, "файл"), false);

        let stats = moderator.stats();
        assert_eq!(stats.total_warnings_issued, 4);
        assert_eq!(stats.users_with_warnings, 2);
        assert_eq!(stats.blacklisted_users, 1);
    }
}
