//! Core types, configuration, and error handling for the gavel bot.
//!
//! This crate provides the shared foundation used by the other gavel crates:
//! - [`GavelError`] — unified error type using `thiserror`
//! - [`GavelConfig`] — configuration loaded from `gavel.toml`
//! - Shared types: [`Event`], [`Change`], [`PatchSet`], [`Verdict`],
//!   [`ActionResult`], [`WatchPolicy`]

mod config;
mod error;
mod types;

pub use config::{CheckConfig, GavelConfig, GerritConfig, WatchPolicy};
pub use error::GavelError;
pub use types::{ActionResult, Author, Change, Event, PatchSet, Verdict};

/// A convenience `Result` type for gavel operations.
pub type Result<T> = std::result::Result<T, GavelError>;
