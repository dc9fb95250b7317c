//! Message delivery primitives shared by the command handlers, the bot,
//! and the file-transfer engine: everything that puts a line on someone's
//! outbound queue goes through here.

use crate::state::{Channel, ServerState, Uid};

/// Sends `line` to every member of `channel` except `exclude`, holding the
/// channel's fanout lock so no two commands interleave their broadcasts
/// (spec §5, "consistent per-channel broadcast snapshots").
pub async fn broadcast_to_channel(
    server: &ServerState,
    channel: &Channel,
    line: &str,
    exclude: Option<Uid>,
) {
    let _guard = channel.fanout_lock.lock().await;
    for member in channel.members.iter() {
        let uid = *member;
        if Some(uid) == exclude {
            continue;
        }
        if let Some(handle) = server.get_client(uid) {
            handle.send_line(line.to_string());
        }
    }
}

pub fn send_to_uid(server: &ServerState, uid: Uid, line: &str) {
    if let Some(handle) = server.get_client(uid) {
        handle.send_line(line.to_string());
    }
}

/// Looks `nick` up and queues `line` for them. Returns whether a matching
/// connection was found.
pub fn send_to_nick(server: &ServerState, nick: &str, line: &str) -> bool {
    match server.find_by_nick(nick) {
        Some(handle) => {
            handle.send_line(line.to_string());
            true
        }
        None => false,
    }
}
