use async_trait::async_trait;

use gavel_core::{Event, Result};

/// Factory for Gerrit connections.
///
/// The supervisor calls [`Connector::connect`] until it succeeds; each
/// failure is logged and followed by a fixed delay.
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// Establish a fresh connection to the event stream.
    ///
    /// # Errors
    ///
    /// Returns an error when the server is unreachable or rejects the
    /// credentials; the supervisor retries indefinitely.
    async fn connect(&self) -> Result<Self::Conn>;
}

/// One live Gerrit connection: the event feed plus the review channel.
///
/// The watcher is the only caller; nothing here is used concurrently.
#[async_trait]
pub trait Connection: Send {
    /// Block until the server sends the next event.
    ///
    /// # Errors
    ///
    /// A decode error for a malformed event leaves the transport usable;
    /// the watcher drops the event and reads on. A transport error is
    /// followed up with [`Connection::is_alive`] to decide whether to
    /// reconnect.
    async fn next_event(&mut self) -> Result<Event>;

    /// Whether the underlying transport still looks alive. Consulted only
    /// after `next_event` or a dispatch step failed.
    fn is_alive(&mut self) -> bool;

    /// Submit a Verified vote on `change_spec` (`"<change>,<patchset>"`).
    ///
    /// # Errors
    ///
    /// A failed submission is logged by the watcher and not retried.
    async fn submit_review(
        &mut self,
        project: &str,
        change_spec: &str,
        message: &str,
        vote: i32,
    ) -> Result<()>;
}
