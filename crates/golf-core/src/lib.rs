//! # golf-core
//!
//! The realtime core of the golf server: who is connected, what they asked
//! for, and who gets told about it.
//!
//! - **ConnectionRegistry** - concurrent map of session id to live connection
//! - **ResponseDispatcher** - fire-and-forget delivery to one, some, or all sessions
//! - **MessageRouter** - decodes inbound payloads and dispatches them to actions
//! - **GameSessionCoordinator** - create/start game actions backed by a [`GameService`]
//! - **ConnectionLifecycleHandler** - connect/disconnect bookkeeping backed by a [`UserService`]
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐    ┌───────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ Transport  │───▶│ MessageRouter │───▶│ Coordinator │───▶│ GameService │
//! └────────────┘    └───────────────┘    └─────────────┘    └─────────────┘
//!       │                                       │
//!       ▼                                       ▼
//! ┌────────────┐    ┌───────────────┐    ┌─────────────┐
//! │ Lifecycle  │───▶│   Registry    │◀───│ Dispatcher  │
//! └────────────┘    └───────────────┘    └─────────────┘
//! ```

pub mod connection;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod registry;
pub mod router;
pub mod service;
pub mod session;

pub use connection::{Connection, Outbox};
pub use coordinator::{GameSessionCoordinator, GAME_ACTIONS_TOTAL};
pub use dispatcher::{Delivery, DeliveryReport, ResponseDispatcher};
pub use error::CoreError;
pub use lifecycle::ConnectionLifecycleHandler;
pub use memory::{InMemoryGameService, InMemoryUserService};
pub use registry::ConnectionRegistry;
pub use router::MessageRouter;
pub use service::{GameService, GameServiceError, UserService, UserServiceError};
pub use session::SessionId;
