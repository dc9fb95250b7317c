//! Nickname and channel name validation (spec §4.3, §6).
//!
//! Grounded in the grammar-driven parsing style the rest of this codebase
//! uses for protocol tokens: a `nom` character-class parser that must
//! consume the whole input.

use nom::{
    Parser,
    character::complete::satisfy,
    combinator::{all_consuming, recognize},
    multi::many1,
};

fn is_nick_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn nickname_parser(input: &str) -> nom::IResult<&str, &str> {
    all_consuming(recognize(many1(satisfy(is_nick_char)))).parse(input)
}

/// Non-empty, `[A-Za-z0-9_-]` only (spec §6).
pub fn is_valid_nickname(nick: &str) -> bool {
    !nick.is_empty() && nickname_parser(nick).is_ok()
}

/// Starts with `#` or `&`; remaining characters unrestricted except
/// CR/LF/space/comma (spec §6).
pub fn is_valid_channel_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some('#') | Some('&') => {}
        _ => return false,
    }
    chars.all(|c| !matches!(c, '\r' | '\n' | ' ' | ','))
}

/// ASCII-only lowercasing, per spec's explicit non-goal of multibyte case
/// folding.
pub fn ascii_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_rules() {
        assert!(is_valid_nickname("alice"));
        assert!(is_valid_nickname("al-ice_99"));
        assert!(!is_valid_nickname(""));
        assert!(!is_valid_nickname("al ice"));
        assert!(!is_valid_nickname("al:ice"));
    }

    #[test]
    fn channel_name_rules() {
        assert!(is_valid_channel_name("#room"));
        assert!(is_valid_channel_name("&local"));
        assert!(!is_valid_channel_name("room"));
        assert!(!is_valid_channel_name("#ro om"));
        assert!(!is_valid_channel_name("#ro,om"));
    }

    #[test]
    fn ascii_lower_only_folds_ascii() {
        assert_eq!(ascii_lower("AlicE"), "alice");
        assert_eq!(ascii_lower("#ROOM"), "#room");
    }
}
