//! Core error types.
//!
//! None of these are fatal: each is contained at the boundary of the
//! connection whose event produced it.

use crate::service::{GameServiceError, UserServiceError};
use crate::session::SessionId;
use golf_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised while serving a connection.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Target session is not registered.
    #[error("Connection not found: {0}")]
    ConnectionNotFound(SessionId),

    /// The transport could not accept the response.
    #[error("Send to {session} failed: {reason}")]
    SendFailed {
        /// Target session.
        session: SessionId,
        /// Underlying cause.
        reason: String,
    },

    /// Inbound payload could not be decoded.
    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] ProtocolError),

    /// The game service rejected an action.
    #[error("Game action failed: {0}")]
    GameActionFailed(#[from] GameServiceError),

    /// The user service could not assign an identity.
    #[error("Identity assignment failed: {0}")]
    IdentityAssignmentFailed(#[from] UserServiceError),
}
