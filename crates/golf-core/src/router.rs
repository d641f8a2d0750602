//! Inbound message routing.
//!
//! The router decodes raw payloads into [`InboundMessage`]s and hands each one
//! to the matching game action. It keeps no state of its own.

use crate::coordinator::GameSessionCoordinator;
use crate::error::CoreError;
use crate::session::SessionId;
use bytes::BytesMut;
use golf_protocol::{codec, InboundMessage, ProtocolError};
use std::sync::Arc;
use tracing::{debug, warn};

/// Dispatches inbound messages to game actions.
#[derive(Clone)]
pub struct MessageRouter {
    coordinator: Arc<GameSessionCoordinator>,
}

impl MessageRouter {
    /// Create a router over a coordinator.
    #[must_use]
    pub fn new(coordinator: Arc<GameSessionCoordinator>) -> Self {
        Self { coordinator }
    }

    /// The coordinator actions are routed to.
    #[must_use]
    pub fn coordinator(&self) -> &Arc<GameSessionCoordinator> {
        &self.coordinator
    }

    /// Route one decoded message from `session`.
    ///
    /// Action failures are logged by the coordinator and go no further.
    pub async fn route(&self, session: &SessionId, message: InboundMessage) {
        debug!(session = %session, kind = message.kind(), "Routing message");

        // The coordinator has already logged (and optionally reported) any
        // failure by the time it returns.
        match message {
            InboundMessage::CreateGame => {
                self.coordinator.create_game(session).await.ok();
            }
            InboundMessage::StartGame { game_id } => {
                self.coordinator.start_game(session, game_id).await.ok();
            }
            InboundMessage::Unknown => {
                warn!(session = %session, "Ignoring unknown message type");
            }
        }
    }

    /// Decode a JSON text payload and route it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedMessage`] if the text is not a message.
    pub async fn route_text(&self, session: &SessionId, text: &str) -> Result<(), CoreError> {
        let message = codec::decode_json(text)?;
        self.route(session, message).await;
        Ok(())
    }

    /// Decode and route every complete MessagePack frame buffered in `buf`.
    ///
    /// Returns the number of messages routed; incomplete trailing data stays
    /// in the buffer. On a malformed frame, routing stops and the error is
    /// returned with the bad frame already consumed, so calling again resumes
    /// with the next frame. An oversized length prefix discards the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedMessage`] for the first bad frame.
    pub async fn route_frames(
        &self,
        session: &SessionId,
        buf: &mut BytesMut,
    ) -> Result<usize, CoreError> {
        let mut routed = 0;
        loop {
            match codec::decode_from::<InboundMessage>(buf) {
                Ok(Some(message)) => {
                    self.route(session, message).await;
                    routed += 1;
                }
                Ok(None) => return Ok(routed),
                Err(err @ ProtocolError::FrameTooLarge(_)) => {
                    buf.clear();
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
