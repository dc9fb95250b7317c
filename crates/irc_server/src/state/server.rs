//! Top-level shared state: the client table and the channel table.

use super::{Channel, ClientHandle, Uid};
use crate::validate::ascii_lower;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Everything a handler needs reach into: clients by [`Uid`], a nick
/// registry for O(1) case-insensitive lookup, and channels keyed by their
/// ASCII-lowercased name.
#[derive(Clone)]
pub struct ServerState {
    pub name: String,
    clients: Arc<DashMap<Uid, ClientHandle>>,
    nicks: Arc<DashMap<String, Uid>>,
    channels: Arc<DashMap<String, Arc<Channel>>>,
    next_uid: Arc<AtomicU64>,
}

impl ServerState {
    pub fn new(name: String) -> Self {
        Self {
            name,
            clients: Arc::new(DashMap::new()),
            nicks: Arc::new(DashMap::new()),
            channels: Arc::new(DashMap::new()),
            next_uid: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next_uid(&self) -> Uid {
        self.next_uid.fetch_add(1, Ordering::Relaxed)
    }

    pub fn insert_client(&self, handle: ClientHandle) {
        self.clients.insert(handle.uid, handle);
    }

    pub fn remove_client(&self, uid: Uid) {
        self.clients.remove(&uid);
    }

    pub fn release_nick(&self, nick: &str) {
        self.nicks.remove(&ascii_lower(nick));
    }

    pub fn get_client(&self, uid: Uid) -> Option<ClientHandle> {
        self.clients.get(&uid).map(|r| r.clone())
    }

    /// Atomically claims `nick` for `uid`, releasing any prior nick it
    /// held. Returns `false` (no mutation) if another uid already holds
    /// it. The check and the insert happen under the same shard lock, so
    /// two concurrent NICKs racing for the same name never both succeed
    /// (spec §8's nickname-uniqueness boundary case).
    pub fn try_claim_nick(&self, uid: Uid, nick: &str, previous: Option<&str>) -> bool {
        use dashmap::mapref::entry::Entry;
        let key = ascii_lower(nick);
        let claimed = match self.nicks.entry(key.clone()) {
            Entry::Occupied(e) => *e.get() == uid,
            Entry::Vacant(e) => {
                e.insert(uid);
                true
            }
        };
        if claimed {
            if let Some(prev) = previous {
                let prev_key = ascii_lower(prev);
                if prev_key != key {
                    self.nicks.remove(&prev_key);
                }
            }
        }
        claimed
    }

    pub fn find_by_nick(&self, nick: &str) -> Option<ClientHandle> {
        let uid = *self.nicks.get(&ascii_lower(nick))?;
        self.get_client(uid)
    }

    pub fn get_channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.get(&ascii_lower(name)).map(|r| r.clone())
    }

    pub fn get_or_create_channel(&self, name: &str) -> Arc<Channel> {
        let key = ascii_lower(name);
        if let Some(existing) = self.channels.get(&key) {
            return existing.clone();
        }
        log::info!("channel {name} created");
        self.channels
            .entry(key)
            .or_insert_with(|| Arc::new(Channel::new(name.to_string())))
            .clone()
    }

    /// Drops a channel from the table once it has no members left.
    pub fn remove_channel_if_empty(&self, name: &str) {
        let key = ascii_lower(name);
        if let Some(chan) = self.channels.get(&key) {
            if chan.is_empty() {
                drop(chan);
                self.channels.remove(&key);
                log::info!("channel {name} destroyed (empty)");
            }
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
