use std::path::PathBuf;

/// Errors that can occur across the gavel bot.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the
/// boundary.
///
/// # Examples
///
/// ```
/// use gavel_core::GavelError;
///
/// let err = GavelError::Config("missing gerrit host".into());
/// assert!(err.to_string().contains("missing gerrit host"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum GavelError {
    /// Filesystem or subprocess I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON deserialization failure (malformed event on the wire).
    #[error("event decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure to establish a Gerrit connection.
    #[error("connect error: {0}")]
    Connect(String),

    /// The event stream died or misbehaved after connecting.
    #[error("transport error: {0}")]
    Transport(String),

    /// A review vote could not be submitted.
    #[error("review error: {0}")]
    Review(String),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
