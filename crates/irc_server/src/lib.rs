//! A single-process chat relay implementing a subset of the IRC text
//! protocol: connection registration, channels with modes, private
//! messaging, moderator actions, an in-process helper bot, and a
//! server-mediated file-transfer facility.

pub mod bot;
pub mod config;
pub mod constants;
pub mod context;
pub mod deliver;
pub mod errors;
pub mod handlers;
pub mod message;
pub mod network;
pub mod replies;
pub mod state;
pub mod transfer;
pub mod validate;
