//! Command dispatcher (spec §4.2): one entry point per protocol line,
//! routing to the handler submodules below.

mod channel;
mod connection;
mod messaging;
mod mode;
mod transfer;

use crate::constants::*;
use crate::context::AppContext;
use crate::errors::HandlerError;
use crate::message::Message;
use crate::replies;
use crate::state::{ClientHandle, Uid};

const PRE_REGISTRATION_COMMANDS: &[&str] = &["PASS", "NICK", "USER", "PING", "PONG", "QUIT"];

/// Dispatches one parsed line. Returns `true` if this call should end the
/// connection (an explicit QUIT ran its cleanup already).
pub async fn dispatch(ctx: &AppContext, uid: Uid, msg: &Message) -> bool {
    let Some(handle) = ctx.server.get_client(uid) else {
        return true;
    };
    let command = msg.command.to_ascii_uppercase();
    let snapshot = handle.snapshot().await;
    let nick_or_star = snapshot.nick.clone().unwrap_or_else(|| "*".to_string());

    if !snapshot.is_registered() && !PRE_REGISTRATION_COMMANDS.contains(&command.as_str()) {
        send_error(ctx, &handle, &nick_or_star, HandlerError::NotRegistered);
        return false;
    }

    match command.as_str() {
        "PASS" => connection::handle_pass(ctx, &handle, &nick_or_star, msg).await,
        "NICK" => connection::handle_nick(ctx, uid, &handle, &nick_or_star, msg).await,
        "USER" => connection::handle_user(ctx, &handle, &nick_or_star, msg).await,
        "PING" => connection::handle_ping(ctx, &handle, msg),
        "PONG" => {}
        "QUIT" => {
            connection::handle_quit(ctx, uid, &handle, &nick_or_star, msg).await;
            return true;
        }
        "PRIVMSG" => messaging::handle_privmsg(ctx, uid, &handle, &nick_or_star, msg, false).await,
        "NOTICE" => messaging::handle_privmsg(ctx, uid, &handle, &nick_or_star, msg, true).await,
        "JOIN" => channel::handle_join(ctx, uid, &handle, &nick_or_star, msg).await,
        "PART" => channel::handle_part(ctx, uid, &handle, &nick_or_star, msg).await,
        "TOPIC" => channel::handle_topic(ctx, uid, &handle, &nick_or_star, msg).await,
        "INVITE" => channel::handle_invite(ctx, uid, &handle, &nick_or_star, msg).await,
        "KICK" => channel::handle_kick(ctx, uid, &handle, &nick_or_star, msg).await,
        "NAMES" => channel::handle_names(ctx, &handle, &nick_or_star, msg).await,
        "MODE" => mode::handle_mode(ctx, uid, &handle, &nick_or_star, msg).await,
        "FILESEND" => transfer::handle_filesend(ctx, uid, &handle, &nick_or_star, msg).await,
        "FILEACCEPT" => transfer::handle_fileaccept(ctx, uid, &handle, &nick_or_star, msg).await,
        "FILEDATA" => transfer::handle_filedata(ctx, uid, &handle, &nick_or_star, msg).await,
        "FILEDONE" => transfer::handle_filedone(ctx, uid, &handle, &nick_or_star, msg).await,
        "FILECANCEL" => transfer::handle_filecancel(ctx, uid, &handle, &nick_or_star, msg).await,
        other => send_error(ctx, &handle, &nick_or_star, HandlerError::UnknownCommand(other.to_string())),
    }
    false
}

pub use connection::cleanup_disconnect;

pub(crate) fn send_error(ctx: &AppContext, handle: &ClientHandle, nick: &str, err: HandlerError) {
    let (code, text) = err.to_reply();
    log::debug!("{} ({code}) -> {nick}: {text}", handle.addr);
    handle.send_line(replies::numeric(ctx.server_name(), code, nick, &text));
}

pub(crate) fn send_numeric(ctx: &AppContext, handle: &ClientHandle, nick: &str, code: u16, rest: &str) {
    handle.send_line(replies::numeric(ctx.server_name(), code, nick, rest));
}

/// Sends the registration burst (just RPL_WELCOME; this relay has no
/// MOTD) the first time a client reaches `Registered`.
pub(crate) fn send_welcome(ctx: &AppContext, handle: &ClientHandle, nick: &str, user: &str) {
    log::info!("{} fully registered as {nick} ({user})", handle.addr);
    let text = format!(":Welcome to {}, {}!{}@{}", ctx.server_name(), nick, user, handle.addr.ip());
    handle.send_line(replies::numeric(ctx.server_name(), RPL_WELCOME, nick, &text));
}
