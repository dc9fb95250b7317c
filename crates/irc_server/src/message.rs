//! Line framing and message parsing (spec §4.1).
//!
//! Two independent pieces: [`LineFramer`] turns a byte stream into
//! CRLF-delimited lines, and [`Message::parse`] turns one such line into a
//! `(prefix, command, params, trailing)` tuple.

/// Accumulates bytes from a connection and yields complete lines.
///
/// Lines longer than [`crate::constants::SOFT_LINE_LIMIT`] are still
/// delivered whole — the cap is advisory, per spec §4.1.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly-read bytes to the internal buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete CRLF-terminated line, if one is buffered.
    /// Returns the line without its trailing CRLF.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.windows(2).position(|w| w == b"\r\n")?;
        let line = self.buf.drain(..pos + 2).collect::<Vec<u8>>();
        Some(line[..line.len() - 2].to_vec())
    }
}

/// A parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl Message {
    /// Parse a single line (already stripped of CRLF). Command matching is
    /// case-insensitive at the call site; `command` here preserves the
    /// wire casing.
    pub fn parse(line: &str) -> Option<Message> {
        let (prefix, remainder) = split_prefix(line)?;
        let (head, trailing) = head_trailing_split(remainder);

        let mut tokens = head.split(' ').filter(|s| !s.is_empty());
        let command = tokens.next()?.to_string();
        let params = tokens.map(str::to_string).collect::<Vec<_>>();

        Some(Message {
            prefix,
            command,
            params,
            trailing,
        })
    }

    /// First positional param, or the nth arg counting params then
    /// trailing — convenience used throughout the handlers.
    pub fn arg(&self, n: usize) -> Option<&str> {
        self.params.get(n).map(String::as_str)
    }
}

/// `[":" prefix SPACE]` — returns `(prefix, remainder)`.
fn split_prefix(line: &str) -> Option<(Option<String>, &str)> {
    if let Some(stripped) = line.strip_prefix(':') {
        let space = stripped.find(' ').unwrap_or(stripped.len());
        let prefix = stripped[..space].to_string();
        let remainder = stripped[space..].trim_start_matches(' ');
        Some((Some(prefix), remainder))
    } else {
        Some((None, line))
    }
}

/// Splits `command [<param>]* [ :<trailing>]` at the first ` :`.
fn head_trailing_split(s: &str) -> (&str, Option<String>) {
    match s.find(" :") {
        Some(idx) => (&s[..idx], Some(s[idx + 2..].to_string())),
        None => {
            if let Some(stripped) = s.strip_prefix(':') {
                ("", Some(stripped.to_string()))
            } else {
                (s, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_command() {
        let msg = Message::parse("PING hello").unwrap();
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.params, vec!["hello"]);
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn parses_prefix_and_trailing() {
        let msg = Message::parse(":alice!a@h PRIVMSG #room :hi there").unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("alice!a@h"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#room"]);
        assert_eq!(msg.trailing.as_deref(), Some("hi there"));
    }

    #[test]
    fn trailing_may_be_empty() {
        let msg = Message::parse("TOPIC #room :").unwrap();
        assert_eq!(msg.trailing.as_deref(), Some(""));
    }

    #[test]
    fn trailing_preserves_spaces() {
        let msg = Message::parse("PRIVMSG #room :a  b   c").unwrap();
        assert_eq!(msg.trailing.as_deref(), Some("a  b   c"));
    }

    #[test]
    fn case_is_preserved_on_command_token() {
        let msg = Message::parse("join #room").unwrap();
        assert_eq!(msg.command, "join");
    }

    #[test]
    fn framer_accumulates_partial_and_splits_multiple() {
        let mut framer = LineFramer::new();
        framer.feed(b"NICK al");
        assert!(framer.next_line().is_none());
        framer.feed(b"ice\r\nUSER a 0 * :A\r\n");
        assert_eq!(framer.next_line().unwrap(), b"NICK alice");
        assert_eq!(framer.next_line().unwrap(), b"USER a 0 * :A");
        assert!(framer.next_line().is_none());
    }

    #[test]
    fn oversize_lines_are_not_truncated() {
        let mut framer = LineFramer::new();
        let body = "x".repeat(1000);
        framer.feed(format!("PRIVMSG #c :{body}\r\n").as_bytes());
        let line = framer.next_line().unwrap();
        assert_eq!(line.len(), "PRIVMSG #c :".len() + 1000);
    }
}
