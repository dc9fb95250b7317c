//! Channel state and its mode flags (spec §4.3).

use super::Uid;
use dashmap::DashSet;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::RwLock;

/// `i`/`t`/`k`/`l` — the four channel modes this relay supports.
#[derive(Debug, Default, Clone)]
pub struct ChannelModes {
    pub invite_only: bool,
    pub topic_locked: bool,
    pub key: Option<String>,
    pub limit: Option<usize>,
}

impl ChannelModes {
    /// Renders the currently-set flags as `+itk` style, with `k`/`l`
    /// arguments appended, for RPL_CHANNELMODEIS.
    pub fn render(&self) -> String {
        let mut flags = String::from("+");
        let mut args = Vec::new();
        if self.invite_only {
            flags.push('i');
        }
        if self.topic_locked {
            flags.push('t');
        }
        if let Some(key) = &self.key {
            flags.push('k');
            args.push(key.clone());
        }
        if let Some(limit) = self.limit {
            flags.push('l');
            args.push(limit.to_string());
        }
        if flags == "+" {
            return String::new();
        }
        if args.is_empty() {
            flags
        } else {
            format!("{flags} {}", args.join(" "))
        }
    }
}

/// One channel. Membership, operator, and invite sets are keyed by
/// connection [`Uid`], not nickname, so a nick change never desyncs them.
#[derive(Debug)]
pub struct Channel {
    pub name: String,
    pub members: DashSet<Uid>,
    pub operators: DashSet<Uid>,
    pub invited: DashSet<Uid>,
    pub topic: RwLock<Option<String>>,
    pub modes: RwLock<ChannelModes>,
    /// Held across a mutate-then-broadcast step so every observer of a
    /// given command sees the channel in the same order (spec §5).
    pub fanout_lock: AsyncMutex<()>,
}

impl Channel {
    pub fn new(name: String) -> Self {
        Self {
            name,
            members: DashSet::new(),
            operators: DashSet::new(),
            invited: DashSet::new(),
            topic: RwLock::new(None),
            modes: RwLock::new(ChannelModes::default()),
            fanout_lock: AsyncMutex::new(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_operator(&self, uid: Uid) -> bool {
        self.operators.contains(&uid)
    }

    /// Adds the member and, if they are the channel's first, makes them
    /// operator (spec §4.3 "first joiner" rule, and the post-leave
    /// auto-promotion in SPEC_FULL section E).
    pub fn add_member(&self, uid: Uid) {
        let was_empty = self.members.is_empty();
        self.members.insert(uid);
        self.invited.remove(&uid);
        if was_empty {
            self.operators.insert(uid);
        }
    }

    /// Removes a member and their operator entry, if any. Does not
    /// auto-promote a replacement operator: that half of the post-leave
    /// rule (spec §4.3) must run as a visible `MODE +o` broadcast, which
    /// requires the caller to still observe an empty `operators` set —
    /// see `handlers::channel::apply_post_leave`.
    pub fn remove_member(&self, uid: Uid) {
        self.members.remove(&uid);
        self.operators.remove(&uid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_joiner_is_promoted() {
        let c = Channel::new("#room".into());
        c.add_member(1);
        assert!(c.is_operator(1));
        c.add_member(2);
        assert!(!c.is_operator(2));
    }

    #[test]
    fn departure_leaves_promotion_to_the_post_leave_rule() {
        let c = Channel::new("#room".into());
        c.add_member(1);
        c.add_member(2);
        c.remove_member(1);
        assert!(!c.is_operator(2), "remove_member itself must not promote");
        assert!(c.members.contains(&2));
        assert!(c.operators.is_empty());
    }

    #[test]
    fn modes_render_empty_when_unset() {
        assert_eq!(ChannelModes::default().render(), "");
    }

    #[test]
    fn modes_render_with_args() {
        let modes = ChannelModes {
            invite_only: true,
            topic_locked: true,
            key: Some("secret".into()),
            limit: Some(10),
        };
        assert_eq!(modes.render(), "+itkl secret 10");
    }
}
