//! External check execution and review report formatting.
//!
//! [`ActionRunner`] spawns the configured run script once per qualifying
//! event and turns its exit status into a [`gavel_core::ActionResult`];
//! [`report::format`] turns that result into the review message and vote.

pub mod report;
pub mod runner;

pub use report::Report;
pub use runner::ActionRunner;
