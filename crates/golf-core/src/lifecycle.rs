//! Connection lifecycle.
//!
//! Keeps the registry and the user service in step with the transport's
//! connect, disconnect and error events.

use crate::connection::Connection;
use crate::dispatcher::ResponseDispatcher;
use crate::error::CoreError;
use crate::registry::ConnectionRegistry;
use crate::service::UserService;
use crate::session::SessionId;
use golf_protocol::OutboundResponse;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handles transport-level connection events.
pub struct ConnectionLifecycleHandler {
    dispatcher: ResponseDispatcher,
    users: Arc<dyn UserService>,
}

impl ConnectionLifecycleHandler {
    /// Create a handler registering into the dispatcher's registry.
    #[must_use]
    pub fn new(dispatcher: ResponseDispatcher, users: Arc<dyn UserService>) -> Self {
        Self { dispatcher, users }
    }

    fn registry(&self) -> &ConnectionRegistry {
        self.dispatcher.registry()
    }

    /// Register a new connection and give its session an anonymous identity.
    ///
    /// The identity is sent to the session as a user response. If the user
    /// service fails, the failure is logged and the connection stays
    /// registered.
    pub async fn on_connect(&self, connection: Connection) {
        let session = connection.session_id().clone();
        if self.registry().register(connection).is_some() {
            warn!(session = %session, "Replaced existing connection for session");
        }
        info!(session = %session, connections = self.registry().len(), "Connection opened");

        match self.users.login_anonymous(&session).await {
            Ok(user) => {
                info!(session = %session, user = %user.as_value(), "Anonymous login");
                self.dispatcher
                    .send_to_session(&session, OutboundResponse::user(user));
            }
            Err(err) => {
                let err = CoreError::IdentityAssignmentFailed(err);
                warn!(session = %session, error = %err, "Connection left without identity");
            }
        }
    }

    /// Unregister a closed connection and tell the user service.
    ///
    /// If the session has since been taken over by a newer connection, the
    /// newer one stays registered and the user service is not told.
    pub async fn on_disconnect(&self, connection: &Connection) {
        let session = connection.session_id();
        if !self.registry().unregister_link(connection) {
            if self.registry().contains(session) {
                debug!(session = %session, "Closed connection was already replaced");
                return;
            }
            debug!(session = %session, "Closed session was not registered");
        }
        info!(session = %session, connections = self.registry().len(), "Connection closed");
        self.users.session_closed(session).await;
    }

    /// Record a transport error. The transport's own close event does the cleanup.
    pub fn on_transport_error(&self, session: &SessionId, cause: &dyn fmt::Display) {
        warn!(session = %session, error = %cause, "Transport error");
    }
}
