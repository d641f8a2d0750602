//! Response delivery.
//!
//! Every send is fire-and-forget: the response is queued on the target's
//! connection and the outcome is only logged. A missing or dead target never
//! stops delivery to the others.

use crate::connection::Connection;
use crate::error::CoreError;
use crate::registry::ConnectionRegistry;
use crate::session::SessionId;
use golf_protocol::OutboundResponse;
use std::sync::Arc;
use tracing::{trace, warn};

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Response was queued on the connection.
    Sent,
    /// No connection is registered for the session.
    Missing,
    /// The connection refused the response.
    Failed,
}

/// Tally of a multi-target delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Responses queued.
    pub delivered: usize,
    /// Targets that were not registered.
    pub missing: usize,
    /// Targets whose connection refused the response.
    pub failed: usize,
}

impl DeliveryReport {
    fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Sent => self.delivered += 1,
            Delivery::Missing => self.missing += 1,
            Delivery::Failed => self.failed += 1,
        }
    }

    /// Number of targets attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.delivered + self.missing + self.failed
    }
}

/// Sends responses to registered connections.
#[derive(Debug, Clone)]
pub struct ResponseDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl ResponseDispatcher {
    /// Create a dispatcher over a registry.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher delivers through.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send a response to one session.
    ///
    /// Returns `true` if the response was queued. Failures are logged, never
    /// raised, and never unregister the target.
    pub fn send_to_session(&self, session_id: &SessionId, response: OutboundResponse) -> bool {
        self.deliver(session_id, &Arc::new(response)) == Delivery::Sent
    }

    /// Send a response to each of the given sessions independently.
    pub fn send_to_sessions<'a, I>(&self, session_ids: I, response: OutboundResponse) -> DeliveryReport
    where
        I: IntoIterator<Item = &'a SessionId>,
    {
        let response = Arc::new(response);
        let mut report = DeliveryReport::default();
        for session_id in session_ids {
            report.record(self.deliver(session_id, &response));
        }
        report
    }

    /// Send a response to every registered connection.
    pub fn broadcast(&self, response: OutboundResponse) -> DeliveryReport {
        let response = Arc::new(response);
        let mut report = DeliveryReport::default();
        for connection in self.registry.all_connections() {
            report.record(Self::push(&connection, &response));
        }
        trace!(
            kind = response.kind(),
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast"
        );
        report
    }

    fn deliver(&self, session_id: &SessionId, response: &Arc<OutboundResponse>) -> Delivery {
        match self.registry.get(session_id) {
            Some(connection) => Self::push(&connection, response),
            None => {
                let err = CoreError::ConnectionNotFound(session_id.clone());
                warn!(session = %session_id, kind = response.kind(), error = %err, "Dropping response");
                Delivery::Missing
            }
        }
    }

    fn push(connection: &Connection, response: &Arc<OutboundResponse>) -> Delivery {
        match connection.send(Arc::clone(response)) {
            Ok(()) => {
                trace!(session = %connection.session_id(), kind = response.kind(), "Queued response");
                Delivery::Sent
            }
            Err(err) => {
                warn!(session = %connection.session_id(), kind = response.kind(), error = %err, "Send failed");
                Delivery::Failed
            }
        }
    }
}
