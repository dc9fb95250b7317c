//! JOIN/PART/TOPIC/INVITE/KICK/NAMES and the post-leave invariant
//! (spec §4.2, §4.3).

use super::{send_error, send_numeric};
use crate::constants::*;
use crate::context::AppContext;
use crate::deliver;
use crate::errors::HandlerError;
use crate::message::Message;
use crate::replies;
use crate::state::{ClientHandle, Uid};
use crate::validate::{ascii_lower, is_valid_channel_name};

async fn require_member<'a>(
    ctx: &AppContext,
    handle: &ClientHandle,
    nick: &str,
    uid: Uid,
    chan_name: &str,
) -> Option<std::sync::Arc<crate::state::Channel>> {
    let Some(chan) = ctx.server.get_channel(chan_name) else {
        send_error(ctx, handle, nick, HandlerError::NoSuchChannel(chan_name.to_string()));
        return None;
    };
    if !chan.members.contains(&uid) {
        send_error(ctx, handle, nick, HandlerError::NotOnChannel(chan_name.to_string()));
        return None;
    }
    Some(chan)
}

/// Post-leave rule (spec §4.3): re-promote an operator if membership is
/// non-empty and operators are empty, then drop the channel if it is now
/// empty.
pub(super) async fn apply_post_leave(ctx: &AppContext, chan_name: &str) {
    let Some(chan) = ctx.server.get_channel(chan_name) else {
        return;
    };
    if !chan.members.is_empty() && chan.operators.is_empty() {
        if let Some(promoted) = chan.members.iter().next().map(|r| *r) {
            chan.operators.insert(promoted);
            if let Some(promoted_handle) = ctx.server.get_client(promoted) {
                let promoted_nick = promoted_handle.snapshot().await.nick.unwrap_or_default();
                let line = replies::relayed(
                    ctx.server_name(),
                    "MODE",
                    &format!("{chan_name} +o {promoted_nick}"),
                );
                deliver::broadcast_to_channel(&ctx.server, &chan, &line, None).await;
            }
        }
    }
    if chan.is_empty() {
        ctx.server.remove_channel_if_empty(chan_name);
    }
}

pub async fn handle_join(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(chan_name) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "JOIN".into() });
    };
    if !is_valid_channel_name(chan_name) {
        return send_error(ctx, handle, nick, HandlerError::NoSuchChannel(chan_name.to_string()));
    }
    let key = msg.arg(1);

    let chan = ctx.server.get_or_create_channel(chan_name);
    let is_new = chan.members.is_empty();

    {
        let modes = chan.modes.read().await;
        if let Some(required) = &modes.key {
            if key != Some(required.as_str()) {
                return send_error(ctx, handle, nick, HandlerError::BadChannelKey(chan_name.to_string()));
            }
        }
        if modes.invite_only && !chan.invited.contains(&uid) {
            return send_error(ctx, handle, nick, HandlerError::InviteOnlyChan(chan_name.to_string()));
        }
        if let Some(limit) = modes.limit {
            if chan.members.len() >= limit {
                return send_error(ctx, handle, nick, HandlerError::ChannelIsFull(chan_name.to_string()));
            }
        }
    }

    chan.add_member(uid);
    handle.channels.insert(ascii_lower(chan_name));

    let join_line = replies::relayed(nick, "JOIN", chan_name);
    deliver::broadcast_to_channel(&ctx.server, &chan, &join_line, None).await;

    if is_new {
        ctx.bot
            .on_channel_created(&ctx.server, chan_name, &ctx.config.bot_greeting)
            .await;
    }

    let topic = chan.topic.read().await.clone();
    match topic {
        Some(t) if !t.is_empty() => send_numeric(ctx, handle, nick, RPL_TOPIC, &format!("{chan_name} :{t}")),
        _ => send_numeric(ctx, handle, nick, RPL_NOTOPIC, &format!("{chan_name} :No topic is set")),
    }

    let mut names = Vec::new();
    for member in chan.members.iter() {
        let m_uid = *member;
        if let Some(m_handle) = ctx.server.get_client(m_uid) {
            let m_nick = m_handle.snapshot().await.nick.unwrap_or_default();
            if chan.is_operator(m_uid) {
                names.push(format!("@{m_nick}"));
            } else {
                names.push(m_nick);
            }
        }
    }
    send_numeric(ctx, handle, nick, RPL_NAMREPLY, &format!("= {chan_name} :{}", names.join(" ")));
    send_numeric(ctx, handle, nick, RPL_ENDOFNAMES, &format!("{chan_name} :End of /NAMES list"));
}

pub async fn handle_part(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(chan_name) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "PART".into() });
    };
    let Some(chan) = require_member(ctx, handle, nick, uid, chan_name).await else {
        return;
    };

    let prefix = handle.prefix().await;
    let rest = match msg.trailing.as_deref() {
        Some(reason) => format!("{chan_name} :{reason}"),
        None => chan_name.to_string(),
    };
    let line = replies::relayed(&prefix, "PART", &rest);
    deliver::broadcast_to_channel(&ctx.server, &chan, &line, None).await;

    chan.remove_member(uid);
    handle.channels.remove(&ascii_lower(chan_name));
    apply_post_leave(ctx, chan_name).await;
}

pub async fn handle_topic(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(chan_name) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "TOPIC".into() });
    };
    let Some(chan) = require_member(ctx, handle, nick, uid, chan_name).await else {
        return;
    };

    match &msg.trailing {
        None => {
            let topic = chan.topic.read().await.clone();
            match topic {
                Some(t) if !t.is_empty() => {
                    send_numeric(ctx, handle, nick, RPL_TOPIC, &format!("{chan_name} :{t}"))
                }
                _ => send_numeric(ctx, handle, nick, RPL_NOTOPIC, &format!("{chan_name} :No topic is set")),
            }
        }
        Some(new_topic) => {
            let topic_locked = chan.modes.read().await.topic_locked;
            if topic_locked && !chan.is_operator(uid) {
                return send_error(ctx, handle, nick, HandlerError::ChanOpPrivsNeeded(chan_name.to_string()));
            }
            *chan.topic.write().await = Some(new_topic.clone());
            let line = replies::relayed(nick, "TOPIC", &format!("{chan_name} :{new_topic}"));
            deliver::broadcast_to_channel(&ctx.server, &chan, &line, None).await;
        }
    }
}

pub async fn handle_invite(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let (Some(target_nick), Some(chan_name)) = (msg.arg(0), msg.arg(1)) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "INVITE".into() });
    };
    let Some(chan) = require_member(ctx, handle, nick, uid, chan_name).await else {
        return;
    };
    if chan.modes.read().await.invite_only && !chan.is_operator(uid) {
        return send_error(ctx, handle, nick, HandlerError::ChanOpPrivsNeeded(chan_name.to_string()));
    }
    let Some(target) = ctx.server.find_by_nick(target_nick) else {
        return send_error(ctx, handle, nick, HandlerError::NoSuchNick(target_nick.to_string()));
    };

    chan.invited.insert(target.uid);
    let line = replies::relayed(nick, "INVITE", &format!("{target_nick} {chan_name}"));
    target.send_line(line);
    send_numeric(ctx, handle, nick, RPL_INVITING, &format!("{chan_name} {target_nick}"));
}

pub async fn handle_kick(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let (Some(chan_name), Some(victim_nick)) = (msg.arg(0), msg.arg(1)) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "KICK".into() });
    };
    let Some(chan) = require_member(ctx, handle, nick, uid, chan_name).await else {
        return;
    };
    if !chan.is_operator(uid) {
        return send_error(ctx, handle, nick, HandlerError::ChanOpPrivsNeeded(chan_name.to_string()));
    }
    let Some(victim) = ctx.server.find_by_nick(victim_nick) else {
        return send_error(ctx, handle, nick, HandlerError::NoSuchNick(victim_nick.to_string()));
    };
    if victim.uid == uid {
        return send_error(ctx, handle, nick, HandlerError::ChanOpPrivsNeeded(chan_name.to_string()));
    }
    if !chan.members.contains(&victim.uid) {
        return send_error(ctx, handle, nick, HandlerError::UserNotInChannel(victim_nick.to_string()));
    }

    let reason = msg.trailing.as_deref().unwrap_or("Kicked");
    let line = replies::relayed(nick, "KICK", &format!("{chan_name} {victim_nick} :{reason}"));
    deliver::broadcast_to_channel(&ctx.server, &chan, &line, None).await;

    chan.remove_member(victim.uid);
    victim.channels.remove(&ascii_lower(chan_name));
    apply_post_leave(ctx, chan_name).await;
}

pub async fn handle_names(ctx: &AppContext, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(chan_name) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "NAMES".into() });
    };
    let Some(chan) = ctx.server.get_channel(chan_name) else {
        return send_error(ctx, handle, nick, HandlerError::NoSuchChannel(chan_name.to_string()));
    };
    let mut names = Vec::new();
    for member in chan.members.iter() {
        let m_uid = *member;
        if let Some(m_handle) = ctx.server.get_client(m_uid) {
            let m_nick = m_handle.snapshot().await.nick.unwrap_or_default();
            if chan.is_operator(m_uid) {
                names.push(format!("@{m_nick}"));
            } else {
                names.push(m_nick);
            }
        }
    }
    send_numeric(ctx, handle, nick, RPL_NAMREPLY, &format!("= {chan_name} :{}", names.join(" ")));
    send_numeric(ctx, handle, nick, RPL_ENDOFNAMES, &format!("{chan_name} :End of /NAMES list"));
}
