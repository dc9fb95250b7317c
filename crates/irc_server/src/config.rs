//! Configuration loading.
//!
//! The CLI contract (spec §6) is exactly `<program> <port> <password>`; the
//! optional `--config <path>` points to a TOML file for everything the wire
//! protocol leaves implementation-defined. Every field has a hardcoded
//! default, so a missing `--config` must not change the CLI contract.

use crate::errors::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Command-line arguments: `irc_server <port> <password> [--config <path>]`.
#[derive(Debug, Parser)]
#[command(name = "irc_server", about = "A single-process IRC relay")]
pub struct Cli {
    /// TCP port to listen on.
    pub port: u16,
    /// Shared password clients must supply via PASS before registering.
    pub password: String,
    /// Optional TOML file with server identity and tuning knobs.
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Implementation-defined knobs a deployer may override via `--config`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name the server uses as the prefix of its own numerics.
    pub name: String,
    /// Nickname of the in-process helper bot.
    pub bot_nick: String,
    /// Directory (relative to the working directory) for saved transfers.
    pub uploads_dir: String,
    /// Greeting the bot posts when it "joins" a newly created channel.
    pub bot_greeting: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "ircserv".to_string(),
            bot_nick: "relaybot".to_string(),
            uploads_dir: "uploads".to_string(),
            bot_greeting: "hi, I'm {nick} — try !help".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from an optional TOML file, falling back to defaults when
    /// `path` is `None`.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let content = fs::read_to_string(Path::new(path))?;
                let config: ServerConfig = toml::from_str(&content)?;
                Ok(config)
            }
        }
    }
}
