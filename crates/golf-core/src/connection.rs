//! Connection handles.
//!
//! A [`Connection`] is the send half of a live client link. Sending only
//! enqueues the response; the transport's writer task drains the queue into
//! the socket and reports its own failures.

use crate::error::CoreError;
use crate::session::SessionId;
use golf_protocol::OutboundResponse;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Queue feeding a connection's writer task.
pub type Outbox = mpsc::UnboundedSender<Arc<OutboundResponse>>;

/// Handle to a live connection.
#[derive(Debug, Clone)]
pub struct Connection {
    session_id: SessionId,
    outbox: Outbox,
}

impl Connection {
    /// Wrap an existing outbox.
    #[must_use]
    pub fn new(session_id: SessionId, outbox: Outbox) -> Self {
        Self { session_id, outbox }
    }

    /// Create a connection together with the receiver its writer task drains.
    #[must_use]
    pub fn channel(
        session_id: SessionId,
    ) -> (Self, mpsc::UnboundedReceiver<Arc<OutboundResponse>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(session_id, tx), rx)
    }

    /// The session this connection belongs to.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Queue a response for delivery without waiting for the transport.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SendFailed`] if the writer task has shut down.
    pub fn send(&self, response: Arc<OutboundResponse>) -> Result<(), CoreError> {
        self.outbox
            .send(response)
            .map_err(|_| CoreError::SendFailed {
                session: self.session_id.clone(),
                reason: "connection writer has shut down".to_string(),
            })
    }

    /// Whether the writer task is still accepting responses.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.outbox.is_closed()
    }

    /// Whether two handles feed the same writer task.
    #[must_use]
    pub fn same_link(&self, other: &Connection) -> bool {
        self.outbox.same_channel(&other.outbox)
    }
}
