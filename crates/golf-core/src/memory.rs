//! In-memory collaborator implementations.
//!
//! These keep just enough state to drive the core end to end: games that can
//! be created and started once, and one anonymous user per open session.

use crate::service::{GameService, GameServiceError, UserService, UserServiceError};
use crate::session::SessionId;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use golf_protocol::{GameId, GameSnapshot, UserSnapshot};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tracing::debug;

/// Lifecycle state of an in-memory game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Created, waiting for the owner to start it.
    Init,
    /// Started.
    Started,
}

impl GameState {
    /// Wire name of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Init => "init",
            GameState::Started => "started",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct GameRecord {
    id: GameId,
    owner: SessionId,
    state: GameState,
    players: Vec<SessionId>,
}

impl GameRecord {
    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::new(json!({
            "id": self.id,
            "state": self.state.as_str(),
            "owner": self.owner,
            "players": self.players,
        }))
    }
}

/// Game service that keeps games in memory.
#[derive(Debug)]
pub struct InMemoryGameService {
    games: DashMap<GameId, GameRecord>,
    next_id: AtomicI64,
}

impl InMemoryGameService {
    /// Create an empty service. The first game gets id 1.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Create an empty service whose first game gets `first_id`.
    #[must_use]
    pub fn starting_at(first_id: GameId) -> Self {
        Self {
            games: DashMap::new(),
            next_id: AtomicI64::new(first_id),
        }
    }

    /// Number of games held.
    #[must_use]
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Current state of a game, if it exists.
    #[must_use]
    pub fn state(&self, game_id: GameId) -> Option<GameState> {
        self.games.get(&game_id).map(|g| g.state)
    }
}

impl Default for InMemoryGameService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameService for InMemoryGameService {
    async fn create_game(&self, owner: &SessionId) -> Result<GameSnapshot, GameServiceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = GameRecord {
            id,
            owner: owner.clone(),
            state: GameState::Init,
            players: vec![owner.clone()],
        };
        let snapshot = record.snapshot();
        self.games.insert(id, record);
        Ok(snapshot)
    }

    async fn start_game(&self, game_id: GameId) -> Result<GameSnapshot, GameServiceError> {
        let mut game = self
            .games
            .get_mut(&game_id)
            .ok_or(GameServiceError::NotFound(game_id))?;

        if game.state != GameState::Init {
            return Err(GameServiceError::InvalidTransition {
                game_id,
                state: game.state.to_string(),
            });
        }

        game.state = GameState::Started;
        Ok(game.snapshot())
    }
}

#[derive(Debug, Clone)]
struct UserRecord {
    id: u64,
    name: String,
}

/// User service that hands out anonymous identities.
#[derive(Debug)]
pub struct InMemoryUserService {
    users: DashMap<SessionId, UserRecord>,
    next_id: AtomicU64,
}

impl InMemoryUserService {
    /// Create an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of sessions with an identity.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Whether a session currently has an identity.
    #[must_use]
    pub fn is_logged_in(&self, session: &SessionId) -> bool {
        self.users.contains_key(session)
    }
}

impl Default for InMemoryUserService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserService for InMemoryUserService {
    async fn login_anonymous(&self, session: &SessionId) -> Result<UserSnapshot, UserServiceError> {
        match self.users.entry(session.clone()) {
            Entry::Occupied(_) => Err(UserServiceError::AlreadyLoggedIn(session.clone())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let user = UserRecord {
                    id,
                    name: format!("anon-{id}"),
                };
                slot.insert(user.clone());
                Ok(UserSnapshot::new(json!({
                    "id": user.id,
                    "name": user.name,
                    "sessionId": session,
                })))
            }
        }
    }

    async fn session_closed(&self, session: &SessionId) {
        if let Some((_, user)) = self.users.remove(session) {
            debug!(session = %session, user = user.id, "Released anonymous user");
        }
    }
}
