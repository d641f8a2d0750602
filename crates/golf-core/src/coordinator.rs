//! Game actions.
//!
//! The coordinator turns a session's request into a game service call and
//! answers the requesting session with the resulting snapshot.

use crate::dispatcher::ResponseDispatcher;
use crate::error::CoreError;
use crate::service::{GameService, GameServiceError};
use crate::session::SessionId;
use golf_protocol::{error_codes, GameId, GameSnapshot, OutboundResponse};
use metrics::counter;
use std::sync::Arc;
use tracing::{info, warn};

/// Counter of game actions, labelled by `action` and `outcome` (`ok` or `failed`).
pub const GAME_ACTIONS_TOTAL: &str = "golf_game_actions_total";

fn record_action(action: &'static str, outcome: &'static str) {
    counter!(GAME_ACTIONS_TOTAL, "action" => action, "outcome" => outcome).increment(1);
}

/// Runs game actions on behalf of sessions.
pub struct GameSessionCoordinator {
    games: Arc<dyn GameService>,
    dispatcher: ResponseDispatcher,
    report_errors: bool,
}

impl GameSessionCoordinator {
    /// Create a coordinator that only logs failed actions.
    #[must_use]
    pub fn new(games: Arc<dyn GameService>, dispatcher: ResponseDispatcher) -> Self {
        Self {
            games,
            dispatcher,
            report_errors: false,
        }
    }

    /// Also send an error response to the session when an action fails.
    #[must_use]
    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    /// The dispatcher used for replies.
    #[must_use]
    pub fn dispatcher(&self) -> &ResponseDispatcher {
        &self.dispatcher
    }

    /// Create a game owned by `session` and send it back to that session.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GameActionFailed`] if the game service refuses.
    /// The failure has already been logged when this returns.
    pub async fn create_game(&self, session: &SessionId) -> Result<GameSnapshot, CoreError> {
        match self.games.create_game(session).await {
            Ok(game) => {
                info!(session = %session, game = %game.as_value(), "Game created");
                record_action("createGame", "ok");
                self.reply(session, game.clone());
                Ok(game)
            }
            Err(err) => Err(self.action_failed(session, "createGame", err)),
        }
    }

    /// Start a game and send its new state back to the requesting session.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::GameActionFailed`] if the game does not exist or
    /// cannot be started. The failure has already been logged when this returns.
    pub async fn start_game(
        &self,
        session: &SessionId,
        game_id: GameId,
    ) -> Result<GameSnapshot, CoreError> {
        match self.games.start_game(game_id).await {
            Ok(game) => {
                info!(session = %session, game_id, game = %game.as_value(), "Game started");
                record_action("startGame", "ok");
                self.reply(session, game.clone());
                Ok(game)
            }
            Err(err) => Err(self.action_failed(session, "startGame", err)),
        }
    }

    fn reply(&self, session: &SessionId, game: GameSnapshot) {
        self.dispatcher
            .send_to_session(session, OutboundResponse::game(game));
    }

    fn action_failed(
        &self,
        session: &SessionId,
        action: &'static str,
        err: GameServiceError,
    ) -> CoreError {
        warn!(session = %session, action, error = %err, "Game action failed");
        record_action(action, "failed");
        if self.report_errors {
            self.dispatcher.send_to_session(
                session,
                OutboundResponse::error(error_codes::GAME_ACTION_FAILED, err.to_string()),
            );
        }
        CoreError::GameActionFailed(err)
    }
}
