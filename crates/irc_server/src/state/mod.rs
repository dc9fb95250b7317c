//! Shared server state: connected clients and channels (spec §3).

mod channel;
mod client;
mod server;

pub use channel::Channel;
pub use client::{Client, ClientHandle, RegistrationState};
pub use server::ServerState;

/// Identifies one connection for the lifetime of the process.
pub type Uid = u64;
