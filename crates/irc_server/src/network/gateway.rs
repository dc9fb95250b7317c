//! Accept loop: binds the listener and spawns one task pair per
//! connection.

use super::connection;
use crate::context::AppContext;
use log::info;
use tokio::net::TcpListener;

pub async fn run(ctx: AppContext, listener: TcpListener) -> std::io::Result<()> {
    loop {
        let (socket, addr) = listener.accept().await?;
        info!("accepted connection from {addr}");
        let ctx = ctx.clone();
        tokio::spawn(async move {
            connection::handle_connection(ctx, socket, addr).await;
        });
    }
}
