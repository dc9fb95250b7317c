//! The in-process helper bot (spec §4.5).
//!
//! The bot has no connection of its own; it speaks by calling the same
//! [`crate::deliver`] primitives any client's PRIVMSG goes through, under
//! its own fixed nickname.

mod calc;
mod commands;

pub use commands::on_privmsg;

use crate::deliver;
use crate::state::ServerState;
use crate::validate::ascii_lower;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Reminder {
    pub where_: String,
    pub who: String,
    pub text: String,
    pub due: u64,
}

#[derive(Debug, Clone)]
pub struct Poll {
    pub question: String,
    pub options: Vec<String>,
    /// Lowercased voter nick -> chosen option index.
    pub votes: std::collections::HashMap<String, usize>,
    pub open: bool,
    pub channel: String,
}

/// One protocol line to feed back through the normal dispatch path as if
/// the given nick had sent it, per spec §4.5's re-entrant dispatch design
/// (and SPEC_FULL §D's operator allowlist for who may trigger one).
#[derive(Debug, Clone)]
pub struct Injected {
    pub as_nick: String,
    pub line: String,
}

pub struct BotState {
    pub nick: String,
    started_at: Instant,
    reminders: Mutex<Vec<Reminder>>,
    polls: Mutex<std::collections::HashMap<u64, Poll>>,
    next_poll_id: AtomicU64,
    /// channel (lowercased) -> nick (lowercased) -> epoch seconds.
    last_seen: DashMap<String, DashMap<String, u64>>,
    admins: HashSet<String>,
}

impl BotState {
    pub fn new(nick: String) -> Self {
        let mut admins = HashSet::new();
        admins.insert("admin".to_string());
        admins.insert("operator".to_string());
        Self {
            nick,
            started_at: Instant::now(),
            reminders: Mutex::new(Vec::new()),
            polls: Mutex::new(std::collections::HashMap::new()),
            next_poll_id: AtomicU64::new(1),
            last_seen: DashMap::new(),
            admins,
        }
    }

    pub fn is_admin(&self, nick: &str) -> bool {
        self.admins.contains(&ascii_lower(nick))
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn now_epoch() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    pub fn record_last_seen(&self, channel: &str, nick: &str) {
        self.last_seen
            .entry(ascii_lower(channel))
            .or_default()
            .insert(ascii_lower(nick), Self::now_epoch());
    }

    pub fn seen(&self, channel: &str, nick: &str) -> Option<u64> {
        self.last_seen
            .get(&ascii_lower(channel))
            .and_then(|m| m.get(&ascii_lower(nick)).map(|v| *v))
    }

    pub async fn add_reminder(&self, where_: String, who: String, text: String, due: u64) {
        self.reminders.lock().await.push(Reminder {
            where_,
            who,
            text,
            due,
        });
    }

    /// Removes and returns every reminder whose `due` has passed.
    pub async fn drain_due_reminders(&self, now: u64) -> Vec<Reminder> {
        let mut guard = self.reminders.lock().await;
        let (due, pending): (Vec<_>, Vec<_>) = guard.drain(..).partition(|r| r.due <= now);
        *guard = pending;
        due
    }

    pub async fn create_poll(&self, channel: String, question: String, options: Vec<String>) -> u64 {
        let id = self.next_poll_id.fetch_add(1, Ordering::Relaxed);
        self.polls.lock().await.insert(
            id,
            Poll {
                question,
                options,
                votes: std::collections::HashMap::new(),
                open: true,
                channel,
            },
        );
        id
    }

    pub async fn vote_poll(&self, id: u64, voter: &str, option: usize) -> Result<(), String> {
        let mut polls = self.polls.lock().await;
        let poll = polls.get_mut(&id).ok_or("no such poll")?;
        if !poll.open {
            return Err("poll is closed".to_string());
        }
        if option == 0 || option > poll.options.len() {
            return Err("no such option".to_string());
        }
        poll.votes.insert(ascii_lower(voter), option - 1);
        Ok(())
    }

    pub async fn show_poll(&self, id: u64) -> Option<Poll> {
        self.polls.lock().await.get(&id).cloned()
    }

    pub async fn close_poll(&self, id: u64) -> Result<(), String> {
        let mut polls = self.polls.lock().await;
        let poll = polls.get_mut(&id).ok_or("no such poll")?;
        poll.open = false;
        Ok(())
    }

    /// Speaks as the bot: to a channel, broadcasts to its members; to a
    /// nick, delivers directly. Silently drops if neither resolves.
    pub async fn say(&self, server: &ServerState, where_: &str, text: &str) {
        let line = format!(
            ":{}!{}@bot PRIVMSG {} :{}",
            self.nick, self.nick, where_, text
        );
        if where_.starts_with('#') || where_.starts_with('&') {
            if let Some(channel) = server.get_channel(where_) {
                deliver::broadcast_to_channel(server, &channel, &line, None).await;
            }
        } else {
            deliver::send_to_nick(server, where_, &line);
        }
    }

    /// Announces a newly created channel: the bot "joins" (without being
    /// added to NAMES) and posts its greeting.
    pub async fn on_channel_created(&self, server: &ServerState, channel: &str, greeting: &str) {
        if let Some(chan) = server.get_channel(channel) {
            let join_line = format!(":{}!{}@bot JOIN {}", self.nick, self.nick, channel);
            deliver::broadcast_to_channel(server, &chan, &join_line, None).await;
        }
        let text = greeting.replace("{nick}", &self.nick);
        self.say(server, channel, &text).await;
    }
}
