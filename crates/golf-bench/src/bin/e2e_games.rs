//! End-to-end game action benchmark.
//!
//! Each client creates a game and starts it, over and over, against a running
//! server speaking JSON. Reports completed round trips per second.
//!
//! ```bash
//! cargo run --release -p golf-server &
//! cargo run --release -p golf-bench --bin e2e_games -- 32
//! ```

use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Barrier;
use tokio_tungstenite::{connect_async, tungstenite::Message};

const SERVER_URL: &str = "ws://127.0.0.1:8080/ws";
const WARMUP_SECS: u64 = 2;
const BENCH_SECS: u64 = 10;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    let num_clients = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(16);

    println!("Golf end-to-end benchmark: {} clients against {}", num_clients, SERVER_URL);
    println!("Warmup: {}s, measurement: {}s", WARMUP_SECS, BENCH_SECS);

    let round_trips = Arc::new(AtomicU64::new(0));
    let barrier = Arc::new(Barrier::new(num_clients + 1));

    let handles: Vec<_> = (0..num_clients)
        .map(|client_id| {
            let round_trips = Arc::clone(&round_trips);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                if let Err(e) = run_client(round_trips, barrier).await {
                    eprintln!("Client {} error: {}", client_id, e);
                }
            })
        })
        .collect();

    barrier.wait().await;
    println!("All {} clients connected", num_clients);

    tokio::time::sleep(Duration::from_secs(WARMUP_SECS)).await;
    round_trips.store(0, Ordering::SeqCst);
    let start = Instant::now();

    tokio::time::sleep(Duration::from_secs(BENCH_SECS)).await;

    let elapsed = start.elapsed().as_secs_f64();
    let total = round_trips.load(Ordering::SeqCst);

    println!();
    println!("Clients:        {:>10}", num_clients);
    println!("Duration:       {:>10.2}s", elapsed);
    println!("Round trips:    {:>10}", total);
    println!("Throughput:     {:>10.0} actions/s", total as f64 / elapsed);
    println!(
        "Per client:     {:>10.0} actions/s",
        total as f64 / elapsed / num_clients as f64
    );

    for handle in handles {
        handle.abort();
    }
}

async fn run_client(round_trips: Arc<AtomicU64>, barrier: Arc<Barrier>) -> Result<(), BoxError> {
    let (ws, _) = connect_async(SERVER_URL).await?;
    let (mut sender, mut receiver) = ws.split();

    // Anonymous identity arrives first.
    next_json(&mut receiver).await?;

    barrier.wait().await;

    loop {
        sender
            .send(Message::Text(r#"{"type":"createGame"}"#.to_string()))
            .await?;
        let created = next_json(&mut receiver).await?;
        let game_id = created["game"]["id"]
            .as_i64()
            .ok_or("game response without id")?;
        round_trips.fetch_add(1, Ordering::Relaxed);

        sender
            .send(Message::Text(format!(
                r#"{{"type":"startGame","gameId":{game_id}}}"#
            )))
            .await?;
        next_json(&mut receiver).await?;
        round_trips.fetch_add(1, Ordering::Relaxed);
    }
}

async fn next_json<S>(receiver: &mut S) -> Result<serde_json::Value, BoxError>
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        match receiver.next().await.ok_or("connection closed")?? {
            Message::Text(text) => return Ok(serde_json::from_str(&text)?),
            Message::Close(_) => return Err("connection closed".into()),
            _ => continue,
        }
    }
}
