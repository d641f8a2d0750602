//! # golf-protocol
//!
//! Wire protocol definitions for the golf realtime server.
//!
//! This crate defines the messages exchanged between game clients and the
//! server, the codecs used to put them on the wire, and protocol versioning.
//!
//! ## Messages
//!
//! - `InboundMessage` - actions requested by a client (`createGame`, `startGame`)
//! - `OutboundResponse` - state pushed to clients (`game`, `user`, `error`)
//!
//! ## Example
//!
//! ```rust
//! use golf_protocol::{codec, InboundMessage};
//!
//! let message: InboundMessage = codec::decode_json(r#"{"type":"startGame","gameId":42}"#).unwrap();
//! assert_eq!(message, InboundMessage::StartGame { game_id: 42 });
//! ```

pub mod codec;
pub mod messages;
pub mod version;

pub use codec::{Encoded, ProtocolError, WireFormat};
pub use messages::{error_codes, GameId, GameSnapshot, InboundMessage, OutboundResponse, UserSnapshot};
pub use version::{Version, PROTOCOL_VERSION};
