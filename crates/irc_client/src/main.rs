//! A bare-bones interactive line client: connects to the relay, prints
//! whatever it receives, and sends whatever you type as a raw protocol
//! line. Useful for poking at the server by hand without a full client.

use std::error::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:6667".to_string());

    let stream = TcpStream::connect(&addr).await?;
    println!("connected to {addr}");
    let (read_half, mut write_half) = stream.into_split();

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            println!("< {line}");
        }
        println!("connection closed by server");
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = stdin.next_line().await {
        write_half.write_all(line.as_bytes()).await?;
        write_half.write_all(b"\r\n").await?;
    }

    reader.abort();
    Ok(())
}
