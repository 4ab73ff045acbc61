//! Supervised Gerrit event-stream connection and the event loop.
//!
//! The pieces, leaf to root:
//! - [`Connector`] / [`Connection`] — the seam to the Gerrit transport,
//!   so the loop can be driven by a fake in tests
//! - [`SshConnector`] — the real transport: a long-lived
//!   `ssh … gerrit stream-events` child process
//! - [`Supervisor`] — owns the connection lifecycle and reconnects
//!   forever with a fixed delay
//! - [`filter`] — pure predicate deciding which events warrant a check
//! - [`Watcher`] — the top-level loop: receive, filter, run, vote

pub mod connection;
pub mod filter;
pub mod ssh;
pub mod supervisor;
pub mod watcher;

pub use connection::{Connection, Connector};
pub use ssh::SshConnector;
pub use supervisor::Supervisor;
pub use watcher::Watcher;
