//! Process entry point: parses the CLI contract (spec §6), wires up
//! shared state, and runs the accept loop.

use clap::Parser;
use flexi_logger::{Duplicate, Logger};
use irc_server::bot::BotState;
use irc_server::config::{Cli, ServerConfig};
use irc_server::context::AppContext;
use irc_server::errors::StartupError;
use irc_server::network;
use irc_server::state::ServerState;
use irc_server::transfer::TransferEngine;
use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ExitCode {
    Logger::try_with_str("info")
        .and_then(|logger| {
            logger
                .log_to_stderr()
                .duplicate_to_stderr(Duplicate::All)
                .start()
        })
        .ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Exit 1 on a malformed CLI invocation (spec §6), not clap's
            // own usage-error code.
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = ServerConfig::load(cli.config.as_deref())?;

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    info!("listening on {addr}");

    let server = ServerState::new(config.name.clone());
    let bot = Arc::new(BotState::new(config.bot_nick.clone()));
    let transfers = Arc::new(TransferEngine::new(config.uploads_dir.clone()));
    let ctx = AppContext {
        server,
        bot,
        transfers,
        config: Arc::new(config),
        password: Arc::new(cli.password),
    };

    network::run(ctx, listener).await.map_err(|source| StartupError::Bind {
        addr: format!("accept loop on {addr}"),
        source,
    })
}
