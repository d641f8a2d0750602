//! Prometheus metrics for sessions, socket traffic and game actions.
//!
//! Game action counts are recorded by `golf-core` under
//! [`golf_core::GAME_ACTIONS_TOTAL`]; everything else is recorded here.

use golf_core::GAME_ACTIONS_TOTAL;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;

const SESSIONS_TOTAL: &str = "golf_sessions_total";
const SESSIONS_ACTIVE: &str = "golf_sessions_active";
const SESSION_DURATION: &str = "golf_session_duration_seconds";
const MESSAGES_TOTAL: &str = "golf_messages_total";
const MESSAGES_BYTES: &str = "golf_messages_bytes";
const HANDLE_SECONDS: &str = "golf_message_handle_seconds";
const ERRORS_TOTAL: &str = "golf_errors_total";

/// Which way a WebSocket message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client to server.
    Inbound,
    /// Server to client.
    Outbound,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Failures the transport counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Inbound payload was not a message.
    Malformed,
    /// The socket reported an error.
    Transport,
    /// An outbound response could not be encoded.
    Encode,
    /// The socket refused an outbound response.
    Send,
}

impl Failure {
    fn label(self) -> &'static str {
        match self {
            Failure::Malformed => "malformed",
            Failure::Transport => "transport",
            Failure::Encode => "encode",
            Failure::Send => "send",
        }
    }
}

/// Register descriptions for every golf metric.
pub fn init_metrics() {
    describe_counter!(SESSIONS_TOTAL, "Sessions opened since start");
    describe_gauge!(SESSIONS_ACTIVE, "Sessions currently open");
    describe_histogram!(SESSION_DURATION, "How long sessions stayed open");
    describe_counter!(MESSAGES_TOTAL, "WebSocket messages by direction");
    describe_counter!(MESSAGES_BYTES, "WebSocket payload bytes by direction");
    describe_histogram!(HANDLE_SECONDS, "Time to route one inbound message");
    describe_counter!(ERRORS_TOTAL, "Transport failures by kind");
    describe_counter!(GAME_ACTIONS_TOTAL, "Game actions by action and outcome");

    info!("Metrics initialized");
}

/// Install the Prometheus exporter on `port`.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener
/// cannot be set up.
pub fn start_metrics_server(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Count one WebSocket message and its payload size.
pub fn record_message(direction: Direction, bytes: usize) {
    let label = direction.label();
    counter!(MESSAGES_TOTAL, "direction" => label).increment(1);
    counter!(MESSAGES_BYTES, "direction" => label).increment(bytes as u64);
}

/// Record how long routing one inbound message took.
pub fn record_handle_time(started: Instant) {
    histogram!(HANDLE_SECONDS).record(started.elapsed().as_secs_f64());
}

/// Count a transport failure.
pub fn record_failure(failure: Failure) {
    counter!(ERRORS_TOTAL, "kind" => failure.label()).increment(1);
}

/// Tracks one open session; records its duration when dropped.
pub struct SessionMetrics {
    opened: Instant,
}

impl SessionMetrics {
    /// Count a newly opened session.
    #[must_use]
    pub fn open() -> Self {
        counter!(SESSIONS_TOTAL).increment(1);
        gauge!(SESSIONS_ACTIVE).increment(1.0);
        Self {
            opened: Instant::now(),
        }
    }
}

impl Drop for SessionMetrics {
    fn drop(&mut self) {
        gauge!(SESSIONS_ACTIVE).decrement(1.0);
        histogram!(SESSION_DURATION).record(self.opened.elapsed().as_secs_f64());
    }
}
