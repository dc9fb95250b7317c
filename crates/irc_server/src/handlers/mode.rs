//! MODE — the four-flag channel mode state machine (spec §4.2).

use super::{send_error, send_numeric};
use crate::constants::*;
use crate::context::AppContext;
use crate::deliver;
use crate::errors::HandlerError;
use crate::message::Message;
use crate::replies;
use crate::state::{ClientHandle, Uid};

pub async fn handle_mode(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(chan_name) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "MODE".into() });
    };
    let Some(chan) = ctx.server.get_channel(chan_name) else {
        return send_error(ctx, handle, nick, HandlerError::NoSuchChannel(chan_name.to_string()));
    };
    if !chan.members.contains(&uid) {
        return send_error(ctx, handle, nick, HandlerError::NotOnChannel(chan_name.to_string()));
    }

    let Some(flags) = msg.arg(1) else {
        let rendered = chan.modes.read().await.render();
        return send_numeric(ctx, handle, nick, RPL_CHANNELMODEIS, &format!("{chan_name} {rendered}"));
    };

    if !chan.is_operator(uid) {
        return send_error(ctx, handle, nick, HandlerError::ChanOpPrivsNeeded(chan_name.to_string()));
    }

    let mut arg_idx = 2;
    let mut applied: Vec<String> = Vec::new();
    let mut sign = '+';

    for flag_char in flags.chars() {
        match flag_char {
            '+' | '-' => sign = flag_char,
            'i' => {
                chan.modes.write().await.invite_only = sign == '+';
                applied.push(format!("{sign}i"));
            }
            't' => {
                chan.modes.write().await.topic_locked = sign == '+';
                applied.push(format!("{sign}t"));
            }
            'k' => {
                if sign == '+' {
                    let Some(key) = msg.arg(arg_idx) else {
                        return send_error(
                            ctx,
                            handle,
                            nick,
                            HandlerError::NeedMoreParams { command: "MODE".into() },
                        );
                    };
                    arg_idx += 1;
                    chan.modes.write().await.key = Some(key.to_string());
                    applied.push(format!("+k {key}"));
                } else {
                    chan.modes.write().await.key = None;
                    applied.push("-k".to_string());
                }
            }
            'o' => {
                let Some(target_nick) = msg.arg(arg_idx) else {
                    return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "MODE".into() });
                };
                arg_idx += 1;
                let Some(target) = ctx.server.find_by_nick(target_nick) else {
                    return send_error(ctx, handle, nick, HandlerError::NoSuchNick(target_nick.to_string()));
                };
                if !chan.members.contains(&target.uid) {
                    return send_error(
                        ctx,
                        handle,
                        nick,
                        HandlerError::UserNotInChannel(target_nick.to_string()),
                    );
                }
                if sign == '+' {
                    chan.operators.insert(target.uid);
                } else {
                    chan.operators.remove(&target.uid);
                }
                applied.push(format!("{sign}o {target_nick}"));
            }
            'l' => {
                if sign == '+' {
                    let Some(raw) = msg.arg(arg_idx) else {
                        return send_error(
                            ctx,
                            handle,
                            nick,
                            HandlerError::NeedMoreParams { command: "MODE".into() },
                        );
                    };
                    arg_idx += 1;
                    let Ok(limit) = raw.parse::<usize>() else {
                        return send_error(
                            ctx,
                            handle,
                            nick,
                            HandlerError::NeedMoreParams { command: "MODE".into() },
                        );
                    };
                    if limit < chan.members.len() {
                        return send_error(
                            ctx,
                            handle,
                            nick,
                            HandlerError::NeedMoreParams { command: "MODE".into() },
                        );
                    }
                    chan.modes.write().await.limit = Some(limit);
                    applied.push(format!("+l {limit}"));
                } else {
                    chan.modes.write().await.limit = None;
                    applied.push("-l".to_string());
                }
            }
            _ => {}
        }
    }

    if applied.is_empty() {
        return;
    }
    let line = replies::relayed(nick, "MODE", &format!("{chan_name} {}", applied.join(" ")));
    deliver::broadcast_to_channel(&ctx.server, &chan, &line, None).await;
}
