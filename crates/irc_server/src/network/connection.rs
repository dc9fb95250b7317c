//! Per-connection reader/writer task split (spec §4.1, §5).
//!
//! The reader owns framing, parsing, and dispatch; the writer only drains
//! the outbound queue. Splitting them means a slow reader on one
//! connection never blocks delivery to another.

use crate::context::AppContext;
use crate::handlers;
use crate::message::{LineFramer, Message};
use crate::state::ClientHandle;
use log::{debug, info};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

pub async fn handle_connection(ctx: AppContext, socket: TcpStream, addr: SocketAddr) {
    let (mut read_half, mut write_half) = socket.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let uid = ctx.server.next_uid();
    let handle = ClientHandle::new(uid, addr, tx);
    ctx.server.insert_client(handle.clone());

    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if write_half.write_all(b"\r\n").await.is_err() {
                break;
            }
            if write_half.flush().await.is_err() {
                break;
            }
        }
    });

    let mut framer = LineFramer::new();
    let mut buf = [0u8; 4096];
    let mut disconnect_reason = "Connection closed";

    loop {
        let n = match read_half.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!("read error from {addr}: {e}");
                break;
            }
        };
        framer.feed(&buf[..n]);
        let mut stop = false;
        while let Some(raw_line) = framer.next_line() {
            let line = String::from_utf8_lossy(&raw_line);
            let Some(msg) = Message::parse(&line) else {
                debug!("unparseable line from {addr}: {line:?}");
                continue;
            };
            if handlers::dispatch(&ctx, uid, &msg).await {
                disconnect_reason = "Client Quit";
                stop = true;
                break;
            }
        }
        if stop {
            break;
        }
    }

    if ctx.server.get_client(uid).is_some() {
        handlers::cleanup_disconnect(&ctx, uid, &handle, disconnect_reason).await;
    }
    writer.abort();
    info!("connection from {addr} closed");
}
