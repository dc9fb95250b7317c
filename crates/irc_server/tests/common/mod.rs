//! Shared harness for the integration tests: spins up the real relay
//! (state + network loop, nothing mocked) on an ephemeral port and gives
//! each test a handful of plain `TcpStream` clients to drive it with.

use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use irc_server::bot::BotState;
use irc_server::config::ServerConfig;
use irc_server::context::AppContext;
use irc_server::network;
use irc_server::state::ServerState;
use irc_server::transfer::TransferEngine;

pub const PASSWORD: &str = "secret";

/// Boots the relay on `127.0.0.1:0` and returns its address. The accept
/// loop keeps running for the lifetime of the test process (tests don't
/// bother tearing it down; each gets its own listener).
pub async fn spawn_server() -> std::net::SocketAddr {
    spawn_server_with_uploads("uploads-test").await
}

pub async fn spawn_server_with_uploads(uploads_dir: &str) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ServerConfig::default();
    config.uploads_dir = uploads_dir.to_string();

    let server = ServerState::new(config.name.clone());
    let bot = Arc::new(BotState::new(config.bot_nick.clone()));
    let transfers = Arc::new(TransferEngine::new(config.uploads_dir.clone()));
    let ctx = AppContext {
        server,
        bot,
        transfers,
        config: Arc::new(config),
        password: Arc::new(PASSWORD.to_string()),
    };

    tokio::spawn(async move {
        let _ = network::run(ctx, listener).await;
    });
    addr
}

pub struct TestClient {
    write: tokio::net::tcp::OwnedWriteHalf,
    lines: Lines<BufReader<OwnedReadHalf>>,
}

impl TestClient {
    pub async fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, write) = stream.into_split();
        Self {
            write,
            lines: BufReader::new(read).lines(),
        }
    }

    pub async fn send(&mut self, line: &str) {
        self.write.write_all(line.as_bytes()).await.unwrap();
        self.write.write_all(b"\r\n").await.unwrap();
    }

    /// Reads the next line, failing the test if none arrives within a
    /// short deadline (the server never sends one).
    pub async fn recv(&mut self) -> String {
        timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("connection closed unexpectedly")
    }

    /// Reads lines until one matching `predicate` is seen, discarding
    /// everything before it. Useful for skipping numerics a test doesn't
    /// care about (e.g. NAMES output ordering).
    pub async fn recv_until(&mut self, predicate: impl Fn(&str) -> bool) -> String {
        loop {
            let line = self.recv().await;
            if predicate(&line) {
                return line;
            }
        }
    }

    pub async fn register(&mut self, nick: &str) {
        self.send(&format!("PASS {PASSWORD}")).await;
        self.send(&format!("NICK {nick}")).await;
        self.send(&format!("USER {nick} 0 * :{nick} Real Name")).await;
        self.recv_until(|l| l.contains(" 001 ")).await;
    }
}
