//! Unified error taxonomy for the relay.
//!
//! Mirrors spec §7: protocol/authorization errors resolve to a numeric
//! reply and never unwind the connection; transport errors trigger
//! disconnect with cleanup; startup errors are fatal.

use crate::constants::*;
use thiserror::Error;

/// Errors surfaced while loading or validating the optional config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Fatal errors that abort process startup (spec §7 "Fatal startup errors").
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised by a command handler while processing one dispatched line.
///
/// None of these unwind the connection: [`HandlerError::reply`] resolves
/// every variant to a numeric, and the dispatcher always continues reading
/// the next line afterwards. The only path that ends a connection is an
/// explicit QUIT or a transport-level error, handled in `network`.
#[derive(Debug, Error, Clone)]
pub enum HandlerError {
    #[error("not registered")]
    NotRegistered,
    #[error("need more params")]
    NeedMoreParams { command: String },
    #[error("already registered")]
    AlreadyRegistered,
    #[error("password mismatch")]
    PasswordMismatch,
    #[error("no nickname given")]
    NoNicknameGiven,
    #[error("erroneous nickname: {0}")]
    ErroneousNickname(String),
    #[error("nickname in use: {0}")]
    NicknameInUse(String),
    #[error("no such nick/channel: {0}")]
    NoSuchNick(String),
    #[error("no such channel: {0}")]
    NoSuchChannel(String),
    #[error("cannot send to channel: {0}")]
    CannotSendToChan(String),
    #[error("not on channel: {0}")]
    NotOnChannel(String),
    #[error("user not in channel: {0}")]
    UserNotInChannel(String),
    #[error("channel op privileges needed: {0}")]
    ChanOpPrivsNeeded(String),
    #[error("invite only channel: {0}")]
    InviteOnlyChan(String),
    #[error("bad channel key: {0}")]
    BadChannelKey(String),
    #[error("channel is full: {0}")]
    ChannelIsFull(String),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("generic error: {0}")]
    Generic(String),
}

impl HandlerError {
    /// Maps a handler error to its wire numeric and human-readable text,
    /// per the selection of contracts in spec §4.2.
    pub fn to_reply(&self) -> (u16, String) {
        match self {
            HandlerError::NotRegistered => (ERR_NOTREGISTERED, ":You have not registered".to_string()),
            HandlerError::NeedMoreParams { command } => {
                (ERR_NEEDMOREPARAMS, format!("{command} :Not enough parameters"))
            }
            HandlerError::AlreadyRegistered => {
                (ERR_ALREADYREGISTRED, ":Unauthorized command (already registered)".to_string())
            }
            HandlerError::PasswordMismatch => (ERR_PASSWDMISMATCH, ":Password incorrect".to_string()),
            HandlerError::NoNicknameGiven => (ERR_NONICKNAMEGIVEN, ":No nickname given".to_string()),
            HandlerError::ErroneousNickname(nick) => {
                (ERR_ERRONEUSNICKNAME, format!("{nick} :Erroneous nickname"))
            }
            HandlerError::NicknameInUse(nick) => {
                (ERR_NICKNAMEINUSE, format!("{nick} :Nickname is already in use"))
            }
            HandlerError::NoSuchNick(target) => (ERR_NOSUCHNICK, format!("{target} :No such nick/channel")),
            HandlerError::NoSuchChannel(chan) => (ERR_NOSUCHCHANNEL, format!("{chan} :No such channel")),
            HandlerError::CannotSendToChan(chan) => {
                (ERR_CANNOTSENDTOCHAN, format!("{chan} :Cannot send to channel"))
            }
            HandlerError::NotOnChannel(chan) => (ERR_NOTONCHANNEL, format!("{chan} :You're not on that channel")),
            HandlerError::UserNotInChannel(nick) => {
                (ERR_USERNOTINCHANNEL, format!("{nick} :They aren't on that channel"))
            }
            HandlerError::ChanOpPrivsNeeded(chan) => {
                (ERR_CHANOPRIVSNEEDED, format!("{chan} :You're not channel operator"))
            }
            HandlerError::InviteOnlyChan(chan) => (ERR_INVITEONLYCHAN, format!("{chan} :Cannot join channel (+i)")),
            HandlerError::BadChannelKey(chan) => (ERR_BADCHANNELKEY, format!("{chan} :Cannot join channel (+k)")),
            HandlerError::ChannelIsFull(chan) => (ERR_CHANNELISFULL, format!("{chan} :Cannot join channel (+l)")),
            HandlerError::UnknownCommand(command) => {
                (ERR_UNKNOWNCOMMAND, format!("{command} :Unknown command"))
            }
            HandlerError::Generic(msg) => (ERR_GENERIC, format!(":{msg}")),
        }
    }
}
