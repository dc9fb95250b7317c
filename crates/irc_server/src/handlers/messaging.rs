//! PRIVMSG/NOTICE and the bot hook (spec §4.2, §4.5).
//!
//! NOTICE is a silent sibling of PRIVMSG (SPEC_FULL §D): same targeting
//! and fanout, but the server and bot never auto-reply to one.

use super::{send_error, dispatch};
use crate::context::AppContext;
use crate::deliver;
use crate::errors::HandlerError;
use crate::message::Message;
use crate::replies;
use crate::state::{ClientHandle, Uid};
use crate::validate::is_valid_channel_name;

pub async fn handle_privmsg(
    ctx: &AppContext,
    uid: Uid,
    handle: &ClientHandle,
    nick: &str,
    msg: &Message,
    is_notice: bool,
) {
    let command = if is_notice { "NOTICE" } else { "PRIVMSG" };
    let Some(targets) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: command.into() });
    };
    let Some(text) = msg.trailing.as_deref() else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: command.into() });
    };

    for target in targets.split(',').filter(|t| !t.is_empty()) {
        if is_valid_channel_name(target) {
            let Some(chan) = ctx.server.get_channel(target) else {
                if !is_notice {
                    send_error(ctx, handle, nick, HandlerError::NoSuchChannel(target.to_string()));
                }
                continue;
            };
            if !chan.members.contains(&uid) {
                if !is_notice {
                    send_error(ctx, handle, nick, HandlerError::NotOnChannel(target.to_string()));
                }
                continue;
            }
            let line = replies::relayed(nick, command, &format!("{target} :{text}"));
            deliver::broadcast_to_channel(&ctx.server, &chan, &line, Some(uid)).await;
        } else {
            let Some(dest) = ctx.server.find_by_nick(target) else {
                if !is_notice {
                    send_error(ctx, handle, nick, HandlerError::NoSuchNick(target.to_string()));
                }
                continue;
            };
            let line = replies::relayed(nick, command, &format!("{target} :{text}"));
            dest.send_line(line);
        }

        if !is_notice {
            let injected = crate::bot::on_privmsg(&ctx.bot, &ctx.server, nick, target, text).await;
            for action in injected {
                replay_as(ctx, &action.as_nick, &action.line).await;
            }
        }
    }
}

/// Feeds a bot-synthesized line back through the normal dispatch path
/// under the impersonated sender's uid, per spec §4.5's re-entrant
/// dispatch requirement.
async fn replay_as(ctx: &AppContext, as_nick: &str, line: &str) {
    let Some(handle) = ctx.server.find_by_nick(as_nick) else {
        return;
    };
    let Some(parsed) = Message::parse(line) else {
        return;
    };
    let _ = Box::pin(dispatch(ctx, handle.uid, &parsed)).await;
}
