//! Everything a connection's dispatch loop needs reach into, bundled so
//! it can be cloned cheaply into each connection task.

use crate::bot::BotState;
use crate::config::ServerConfig;
use crate::state::ServerState;
use crate::transfer::TransferEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub server: ServerState,
    pub bot: Arc<BotState>,
    pub transfers: Arc<TransferEngine>,
    pub config: Arc<ServerConfig>,
    pub password: Arc<String>,
}

impl AppContext {
    pub fn server_name(&self) -> &str {
        &self.server.name
    }
}
