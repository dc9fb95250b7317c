//! Spawns many virtual clients against a running server and has them
//! hammer a shared channel, to shake out broadcast-fanout regressions.
//!
//! Not part of the protocol surface; a standalone tool for exercising the
//! event loop under concurrent load.

use std::error::Error;
use tokio::io::{self, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{self, Duration};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let server_addr = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:6667".to_string());
    let password = std::env::args().nth(2).unwrap_or_else(|| "secret".to_string());
    let num_clients: usize = std::env::args().nth(3).and_then(|s| s.parse().ok()).unwrap_or(200);
    let interval_ms: u64 = 1000;

    println!("starting load test: {num_clients} clients against {server_addr}");

    for i in 0..num_clients {
        let addr = server_addr.clone();
        let pw = password.clone();
        tokio::spawn(async move {
            if let Err(e) = run_client(i, &addr, &pw, interval_ms).await {
                eprintln!("client {i} error: {e}");
            }
        });
        time::sleep(Duration::from_millis(5)).await;
    }

    std::future::pending::<()>().await;
    Ok(())
}

async fn run_client(id: usize, addr: &str, password: &str, interval: u64) -> io::Result<()> {
    let mut stream = TcpStream::connect(addr).await?;
    let nick = format!("loadbot{id}");

    let login = format!("PASS {password}\r\nNICK {nick}\r\nUSER {nick} 0 * :Load Tester\r\n");
    stream.write_all(login.as_bytes()).await?;
    stream.write_all(b"JOIN #stress_test\r\n").await?;

    let mut ticker = time::interval(Duration::from_millis(interval));
    let mut count = 0usize;
    loop {
        ticker.tick().await;
        let msg = format!("PRIVMSG #stress_test :message from {nick} - {count}\r\n");
        count += 1;
        if stream.write_all(msg.as_bytes()).await.is_err() {
            break;
        }
    }
    Ok(())
}
