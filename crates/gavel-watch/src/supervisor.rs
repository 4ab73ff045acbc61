use std::time::Duration;

use tracing::{info, warn};

use crate::connection::Connector;

/// Default delay between failed connect attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Owns the connection lifecycle: connect, hold, reconnect.
///
/// Two states only: disconnected (no handle) and connected. The supervisor
/// never detects liveness itself; the watcher reports transport death via
/// [`Supervisor::mark_dead`] and the next [`Supervisor::ensure_connected`]
/// call rebuilds the connection.
///
/// Connect failures are retried forever with a fixed delay. This is a
/// long-running daemon; it must ride out server restarts and network
/// outages of any length.
pub struct Supervisor<C: Connector> {
    connector: C,
    conn: Option<C::Conn>,
    retry_delay: Duration,
}

impl<C: Connector> Supervisor<C> {
    /// Supervise `connector` with the default one-second retry delay.
    pub fn new(connector: C) -> Self {
        Self::with_retry_delay(connector, RETRY_DELAY)
    }

    /// Supervise `connector` with a custom retry delay. Tests inject a
    /// short delay here instead of sleeping for real.
    pub fn with_retry_delay(connector: C, retry_delay: Duration) -> Self {
        Self {
            connector,
            conn: None,
            retry_delay,
        }
    }

    /// Whether a connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Block until connected, then hand out the connection.
    ///
    /// Returns immediately when already connected. Otherwise attempts to
    /// connect in a loop, logging each failure and sleeping the retry
    /// delay in between. This never errors; it only returns connected.
    pub async fn ensure_connected(&mut self) -> &mut C::Conn {
        if self.conn.is_none() {
            loop {
                match self.connector.connect().await {
                    Ok(conn) => {
                        info!("connected to gerrit event stream");
                        self.conn = Some(conn);
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "connect to gerrit failed, retrying");
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }
        match self.conn.as_mut() {
            Some(conn) => conn,
            None => unreachable!("connection established above"),
        }
    }

    /// Drop the current connection so the next `ensure_connected` call
    /// reconnects. Called by the watcher when the transport reports dead.
    pub fn mark_dead(&mut self) {
        if self.conn.take().is_some() {
            warn!("gerrit connection marked dead");
        }
    }
}
