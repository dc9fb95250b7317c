//! Per-connection state and the registration state machine (spec §4.2).

use super::Uid;
use dashmap::DashSet;
use std::net::SocketAddr;
use tokio::sync::{Mutex, mpsc};

/// Registration walks forward only: `NEW` -> `PassOk` -> `NickOk` ->
/// `Registered`. PASS must precede everything else; NICK and USER may
/// arrive in either order once PASS has succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    New,
    PassOk,
    NickOk,
    Registered,
}

/// Mutable fields behind one client's lock. Split out of [`ClientHandle`]
/// so the handle itself can be cloned freely and shared across tasks.
#[derive(Debug)]
pub struct Client {
    pub state: RegistrationState,
    pub nick: Option<String>,
    pub user: Option<String>,
    pub realname: Option<String>,
    pub has_user: bool,
}

impl Client {
    fn new() -> Self {
        Self {
            state: RegistrationState::New,
            nick: None,
            user: None,
            realname: None,
            has_user: false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.state == RegistrationState::Registered
    }

    /// Advances the state machine once both NICK and USER have landed on
    /// top of an accepted PASS. Idempotent past `Registered`.
    fn maybe_complete_registration(&mut self) {
        if self.state == RegistrationState::Registered {
            return;
        }
        if self.nick.is_some() && self.has_user {
            self.state = RegistrationState::Registered;
        } else if self.nick.is_some() && self.state == RegistrationState::PassOk {
            self.state = RegistrationState::NickOk;
        }
    }

    pub fn accept_pass(&mut self) {
        if self.state == RegistrationState::New {
            self.state = RegistrationState::PassOk;
        }
    }

    pub fn set_nick(&mut self, nick: String) {
        self.nick = Some(nick);
        self.maybe_complete_registration();
    }

    pub fn set_user(&mut self, user: String, realname: String) {
        self.user = Some(user);
        self.realname = Some(realname);
        self.has_user = true;
        self.maybe_complete_registration();
    }
}

/// A handle to one connection, shared between its reader task (which owns
/// dispatch) and anything elsewhere in the server that needs to reach it
/// (channel fanout, the bot, file transfers).
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub uid: Uid,
    pub addr: SocketAddr,
    pub outbound: mpsc::UnboundedSender<String>,
    pub channels: std::sync::Arc<DashSet<String>>,
    inner: std::sync::Arc<Mutex<Client>>,
}

impl ClientHandle {
    pub fn new(uid: Uid, addr: SocketAddr, outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            uid,
            addr,
            outbound,
            channels: std::sync::Arc::new(DashSet::new()),
            inner: std::sync::Arc::new(Mutex::new(Client::new())),
        }
    }

    pub async fn with<R>(&self, f: impl FnOnce(&mut Client) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }

    pub async fn snapshot(&self) -> Client {
        let guard = self.inner.lock().await;
        Client {
            state: guard.state,
            nick: guard.nick.clone(),
            user: guard.user.clone(),
            realname: guard.realname.clone(),
            has_user: guard.has_user,
        }
    }

    /// Queue a line for delivery; drops silently if the writer task has
    /// already gone away (connection is closing).
    pub fn send_line(&self, line: String) {
        let _ = self.outbound.send(line);
    }

    /// `nick!user@host`, for use as a message prefix. Falls back to `*`
    /// for fields not yet set, which should never be observed post-
    /// registration. PART is the only relayed command that uses this full
    /// form (spec §9's ambiguity note); every other relayed command uses
    /// the bare nick instead.
    pub async fn prefix(&self) -> String {
        let c = self.snapshot().await;
        format!(
            "{}!{}@{}",
            c.nick.as_deref().unwrap_or("*"),
            c.user.as_deref().unwrap_or("*"),
            self.addr.ip()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_requires_pass_then_nick_and_user() {
        let mut c = Client::new();
        assert_eq!(c.state, RegistrationState::New);
        c.set_nick("alice".into());
        assert_eq!(c.state, RegistrationState::New, "nick before pass doesn't advance");

        c.accept_pass();
        assert_eq!(c.state, RegistrationState::PassOk);
        c.set_nick("alice".into());
        assert_eq!(c.state, RegistrationState::NickOk);
        c.set_user("a".into(), "Alice".into());
        assert_eq!(c.state, RegistrationState::Registered);
    }

    #[test]
    fn user_then_nick_also_completes() {
        let mut c = Client::new();
        c.accept_pass();
        c.set_user("a".into(), "Alice".into());
        assert_eq!(c.state, RegistrationState::PassOk);
        c.set_nick("alice".into());
        assert_eq!(c.state, RegistrationState::Registered);
    }
}
