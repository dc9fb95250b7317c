//! FILESEND/FILEACCEPT/FILEDATA/FILEDONE/FILECANCEL (spec §4.4).

use super::{send_error, send_numeric};
use crate::constants::*;
use crate::context::AppContext;
use crate::errors::HandlerError;
use crate::message::Message;
use crate::state::{ClientHandle, Uid};

pub async fn handle_filesend(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(target_nick) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "FILESEND".into() });
    };
    let Some(size_raw) = msg.arg(1) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "FILESEND".into() });
    };
    let Some(filename) = msg.trailing.as_deref().filter(|f| !f.is_empty()) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "FILESEND".into() });
    };
    let size_total: u64 = size_raw.parse().unwrap_or(0);

    let Some(dest) = ctx.server.find_by_nick(target_nick) else {
        return send_error(ctx, handle, nick, HandlerError::NoSuchNick(target_nick.to_string()));
    };

    match ctx.transfers.create_offer(uid, dest.uid, filename, size_total).await {
        Ok((id, _saved_path)) => {
            send_numeric(
                ctx,
                handle,
                nick,
                RPL_FILEOFFERSENT,
                &format!("{target_nick} {id} {size_raw} :{filename}"),
            );
            let dest_nick = dest.snapshot().await.nick.unwrap_or_else(|| "*".to_string());
            send_numeric(
                ctx,
                &dest,
                &dest_nick,
                RPL_FILEOFFER,
                &format!("{nick} {id} {size_raw} :{filename}"),
            );
        }
        Err(e) => send_numeric(ctx, handle, nick, ERR_GENERIC, &format!(":{e}")),
    }
}

pub async fn handle_fileaccept(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(id_raw) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "FILEACCEPT".into() });
    };
    let Ok(id) = id_raw.parse::<u64>() else {
        return send_numeric(ctx, handle, nick, ERR_GENERIC, &format!("{id_raw} :Invalid transfer id"));
    };

    let ctx = ctx.clone();
    let handle = handle.clone();
    let nick = nick.to_string();
    let id_raw = id_raw.to_string();
    tokio::spawn(async move {
        if let Err(e) = ctx
            .transfers
            .accept_and_stream(id, uid, &ctx.server, ctx.server_name())
            .await
        {
            send_numeric(&ctx, &handle, &nick, ERR_GENERIC, &format!("{id_raw} :{e}"));
        }
    });
}

pub async fn handle_filedata(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let (Some(id_raw), Some(chunk)) = (msg.arg(0), msg.arg(1)) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "FILEDATA".into() });
    };
    let Ok(id) = id_raw.parse::<u64>() else {
        return send_numeric(ctx, handle, nick, ERR_GENERIC, &format!("{id_raw} :Invalid transfer id"));
    };
    match ctx.transfers.push_data(id, uid, chunk).await {
        Ok(receiver) => {
            let line = crate::replies::numeric(ctx.server_name(), RPL_FILEDATA, "*", chunk);
            crate::deliver::send_to_uid(&ctx.server, receiver, &line);
        }
        Err(e) => send_numeric(ctx, handle, nick, ERR_GENERIC, &format!("{id_raw} :{e}")),
    }
}

pub async fn handle_filedone(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(id_raw) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "FILEDONE".into() });
    };
    let Ok(id) = id_raw.parse::<u64>() else {
        return send_numeric(ctx, handle, nick, ERR_GENERIC, &format!("{id_raw} :Invalid transfer id"));
    };
    if let Err(e) = ctx.transfers.finish_legacy(id, uid, &ctx.server, ctx.server_name()).await {
        send_numeric(ctx, handle, nick, ERR_GENERIC, &format!("{id_raw} :{e}"));
    }
}

pub async fn handle_filecancel(ctx: &AppContext, uid: Uid, handle: &ClientHandle, nick: &str, msg: &Message) {
    let Some(id_raw) = msg.arg(0) else {
        return send_error(ctx, handle, nick, HandlerError::NeedMoreParams { command: "FILECANCEL".into() });
    };
    let Ok(id) = id_raw.parse::<u64>() else {
        return send_numeric(ctx, handle, nick, ERR_GENERIC, &format!("{id_raw} :Invalid transfer id"));
    };
    match ctx.transfers.cancel(id, uid).await {
        Ok(reason) => send_numeric(ctx, handle, nick, RPL_FILECANCELLED, &format!("{id_raw} :{reason}")),
        Err(e) => send_numeric(ctx, handle, nick, ERR_GENERIC, &format!("{id_raw} :{e}")),
    }
}
