//! Wire formatting for numeric replies and relayed commands.
//!
//! Every line this server emits goes through here so the `:<prefix> ...`
//! shape (spec §4.1) is assembled in exactly one place.

/// `:<prefix> <code> <target> <rest>`, the shape of every numeric reply.
pub fn numeric(server_name: &str, code: u16, target: &str, rest: &str) -> String {
    format!(":{server_name} {code:03} {target} {rest}")
}

/// `:<prefix> <COMMAND> <rest>`, for relaying a client-originated command
/// (JOIN, PART, PRIVMSG, ...) to other clients under the sender's own
/// prefix rather than the server's.
pub fn relayed(prefix: &str, command: &str, rest: &str) -> String {
    format!(":{prefix} {command} {rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_pads_code_to_three_digits() {
        assert_eq!(numeric("ircserv", 1, "alice", ":hi"), ":ircserv 001 alice :hi");
    }

    #[test]
    fn relayed_uses_sender_prefix() {
        assert_eq!(
            relayed("alice!a@h", "JOIN", "#room"),
            ":alice!a@h JOIN #room"
        );
    }
}
