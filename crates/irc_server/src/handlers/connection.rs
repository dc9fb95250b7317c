//! PASS/NICK/USER/PING/PONG/QUIT — registration and keepalive (spec §4.2).

use super::{channel, send_error, send_numeric, send_welcome};
use crate::context::AppContext;
use crate::deliver;
use crate::errors::HandlerError;
use crate::message::Message;
use crate::replies;
use crate::state::{ClientHandle, RegistrationState, Uid};
use crate::validate::is_valid_nickname;

pub async fn handle_pass(ctx: &AppContext, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(pw) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "PASS".into() });
    };
    let already = handle.snapshot().await.state == RegistrationState::Registered;
    if already {
        return send_error(ctx, handle, nick, HandlerError::AlreadyRegistered);
    }
    if pw != ctx.password.as_str() {
        return send_error(ctx, handle, nick, HandlerError::PasswordMismatch);
    }
    handle.with(|c| c.accept_pass()).await;
}

pub async fn handle_nick(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    if handle.snapshot().await.state == RegistrationState::New {
        return send_error(ctx, handle, nick, HandlerError::NotRegistered);
    }
    let new_nick = msg.arg(0).unwrap_or("");
    if new_nick.is_empty() {
        return send_error(ctx, handle, nick, HandlerError::NoNicknameGiven);
    }
    if !is_valid_nickname(new_nick) {
        return send_error(ctx, handle, nick, HandlerError::ErroneousNickname(new_nick.to_string()));
    }
    let before = handle.snapshot().await;
    let old_nick = before.nick.clone();
    if !ctx.server.try_claim_nick(uid, new_nick, old_nick.as_deref()) {
        return send_error(ctx, handle, nick, HandlerError::NicknameInUse(new_nick.to_string()));
    }
    handle.with(|c| c.set_nick(new_nick.to_string())).await;
    let after = handle.snapshot().await;

    if let Some(old) = &old_nick {
        let line = replies::relayed(old, "NICK", &format!(":{new_nick}"));
        for chan_name in handle.channels.iter() {
            if let Some(chan) = ctx.server.get_channel(&chan_name) {
                deliver::broadcast_to_channel(&ctx.server, &chan, &line, None).await;
            }
        }
    }

    if !before.is_registered() && after.is_registered() {
        send_welcome(ctx, handle, new_nick, after.user.as_deref().unwrap_or("*"));
    }
}

pub async fn handle_user(ctx: &AppContext, handle: &ClientHandle, nick: &str, msg: &Message) {
    let snapshot = handle.snapshot().await;
    if snapshot.state == RegistrationState::New || snapshot.nick.is_none() {
        return send_error(ctx, handle, nick, HandlerError::NotRegistered);
    }
    let (Some(user), Some(_mode), Some(_unused), Some(realname)) =
        (msg.arg(0), msg.arg(1), msg.arg(2), msg.trailing.as_deref())
    else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "USER".into() });
    };
    if realname.is_empty() {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "USER".into() });
    }

    let before = handle.snapshot().await;
    handle.with(|c| c.set_user(user.to_string(), realname.to_string())).await;
    let after = handle.snapshot().await;

    if !before.is_registered() && after.is_registered() {
        let current_nick = after.nick.as_deref().unwrap_or(nick);
        send_welcome(ctx, handle, current_nick, user);
    }
}

pub fn handle_ping(ctx: &AppContext, handle: &ClientHandle, msg: &Message) {
    let token = msg.arg(0).or(msg.trailing.as_deref()).unwrap_or("");
    handle.send_line(format!("PONG {} :{token}", ctx.server_name()));
}

pub async fn handle_quit(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let reason = msg.trailing.as_deref().unwrap_or("Client Quit");
    let _ = nick;
    cleanup_disconnect(ctx, uid, handle, reason).await;
}

/// Removes a client from every channel it held membership in (broadcasting
/// QUIT and applying the post-leave rule per channel), then drops it from
/// the server's client and nick tables. Shared by an explicit QUIT and an
/// abrupt socket close.
pub async fn cleanup_disconnect(ctx: &AppContext, uid: Uid, handle: &ClientHandle, reason: &str) {
    let nick = handle.snapshot().await.nick.unwrap_or_else(|| "*".to_string());
    let line = replies::relayed(&nick, "QUIT", &format!(":{reason}"));
    let channels: Vec<String> = handle.channels.iter().map(|c| c.clone()).collect();
    for chan_name in &channels {
        if let Some(chan) = ctx.server.get_channel(chan_name) {
            deliver::broadcast_to_channel(&ctx.server, &chan, &line, Some(uid)).await;
            chan.remove_member(uid);
            channel::apply_post_leave(ctx, chan_name).await;
        }
    }
    if let Some(nick) = handle.snapshot().await.nick {
        ctx.server.release_nick(&nick);
    }
    ctx.server.remove_client(uid);
}
