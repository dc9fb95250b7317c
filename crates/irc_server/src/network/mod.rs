//! The non-blocking event loop: TCP acceptor and per-connection tasks
//! (spec §2, §5).
//!
//! Each connection gets its own reader and writer task, joined only by
//! an unbounded mpsc channel — there is no shared-memory fast path here,
//! everything that crosses connections goes through [`crate::state`] and
//! [`crate::deliver`].

mod connection;
mod gateway;

pub use gateway::run;
