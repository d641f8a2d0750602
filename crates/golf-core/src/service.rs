//! Collaborator traits.
//!
//! Game rules and user identity live outside the core. The core talks to them
//! through these traits and only forwards the snapshots they return.

use crate::session::SessionId;
use async_trait::async_trait;
use golf_protocol::{GameId, GameSnapshot, UserSnapshot};
use thiserror::Error;

/// Errors reported by a [`GameService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameServiceError {
    /// No game with this id exists.
    #[error("Game not found: {0}")]
    NotFound(GameId),

    /// The game cannot make the requested transition from its current state.
    #[error("Game {game_id} cannot leave state '{state}'")]
    InvalidTransition {
        /// Game that rejected the transition.
        game_id: GameId,
        /// State the game is currently in.
        state: String,
    },

    /// The service could not process the request.
    #[error("Game service unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by a [`UserService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserServiceError {
    /// The session already has an identity.
    #[error("Session already logged in: {0}")]
    AlreadyLoggedIn(SessionId),

    /// The service could not process the request.
    #[error("User service unavailable: {0}")]
    Unavailable(String),
}

/// Owner of game state and rules.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameService: Send + Sync {
    /// Create a new game owned by `owner`.
    async fn create_game(&self, owner: &SessionId) -> Result<GameSnapshot, GameServiceError>;

    /// Move a game to its started state.
    async fn start_game(&self, game_id: GameId) -> Result<GameSnapshot, GameServiceError>;
}

/// Owner of user identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Assign an anonymous identity to a freshly connected session.
    async fn login_anonymous(&self, session: &SessionId) -> Result<UserSnapshot, UserServiceError>;

    /// Release whatever the service associated with a closed session.
    async fn session_closed(&self, session: &SessionId);
}
