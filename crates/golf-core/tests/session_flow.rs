//! End-to-end flow through the core with the in-memory services.

use golf_core::{
    Connection, ConnectionLifecycleHandler, ConnectionRegistry, GameSessionCoordinator,
    InMemoryGameService, InMemoryUserService, MessageRouter, ResponseDispatcher, SessionId,
};
use golf_protocol::{InboundMessage, OutboundResponse};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

struct Harness {
    registry: Arc<ConnectionRegistry>,
    dispatcher: ResponseDispatcher,
    router: MessageRouter,
    lifecycle: ConnectionLifecycleHandler,
    users: Arc<InMemoryUserService>,
}

fn harness(first_game_id: i64) -> Harness {
    let registry = Arc::new(ConnectionRegistry::new());
    let dispatcher = ResponseDispatcher::new(Arc::clone(&registry));
    let users = Arc::new(InMemoryUserService::new());
    let games = Arc::new(InMemoryGameService::starting_at(first_game_id));
    let coordinator = GameSessionCoordinator::new(games, dispatcher.clone());

    Harness {
        registry,
        router: MessageRouter::new(Arc::new(coordinator)),
        lifecycle: ConnectionLifecycleHandler::new(dispatcher.clone(), users.clone()),
        dispatcher,
        users,
    }
}

type Inbox = UnboundedReceiver<Arc<OutboundResponse>>;

async fn connect(h: &Harness, id: &str) -> (Connection, Inbox) {
    let (conn, mut rx) = Connection::channel(id.into());
    h.lifecycle.on_connect(conn.clone()).await;
    // Drain the anonymous-login response.
    assert!(matches!(&*rx.try_recv().unwrap(), OutboundResponse::User { .. }));
    (conn, rx)
}

#[tokio::test]
async fn create_game_scenario() {
    let h = harness(42);
    let s1 = SessionId::from("S1");

    let (conn1, mut rx1) = connect(&h, "S1").await;
    let (_conn2, mut rx2) = connect(&h, "S2").await;
    assert!(h.registry.contains("S1"));
    assert!(h.users.is_logged_in(&s1));

    h.router.route(&s1, InboundMessage::CreateGame).await;

    match &*rx1.try_recv().unwrap() {
        OutboundResponse::Game { game } => {
            assert_eq!(game.as_value()["id"], 42);
            assert_eq!(game.as_value()["owner"], "S1");
        }
        other => panic!("Expected game response, got {:?}", other),
    }
    assert!(rx1.try_recv().is_err());
    assert!(rx2.try_recv().is_err());

    h.lifecycle.on_disconnect(&conn1).await;
    assert!(!h.registry.contains("S1"));
    assert!(!h.users.is_logged_in(&s1));

    assert!(!h
        .dispatcher
        .send_to_session(&s1, OutboundResponse::error(0, "late")));
    assert!(!h.registry.contains("S1"));
    assert_eq!(h.registry.len(), 1);
}

#[tokio::test]
async fn start_game_scenario() {
    let h = harness(1);
    let s1 = SessionId::from("S1");
    let (_conn1, mut rx1) = connect(&h, "S1").await;

    h.router
        .route_text(&s1, r#"{"type":"createGame"}"#)
        .await
        .unwrap();
    h.router
        .route_text(&s1, r#"{"type":"startGame","gameId":1}"#)
        .await
        .unwrap();

    let states: Vec<String> = std::iter::from_fn(|| rx1.try_recv().ok())
        .map(|resp| match &*resp {
            OutboundResponse::Game { game } => {
                game.as_value()["state"].as_str().unwrap().to_string()
            }
            other => panic!("Expected game response, got {:?}", other),
        })
        .collect();
    assert_eq!(states, vec!["init", "started"]);

    // Starting a missing game or starting twice only logs.
    h.router
        .route(&s1, InboundMessage::StartGame { game_id: 999 })
        .await;
    h.router
        .route(&s1, InboundMessage::StartGame { game_id: 1 })
        .await;
    assert!(rx1.try_recv().is_err());
    assert!(h.registry.contains("S1"));
}

#[tokio::test]
async fn broadcast_skips_dead_connection() {
    let h = harness(1);
    let mut receivers = Vec::new();
    for i in 0..5 {
        receivers.push(connect(&h, &format!("S{i}")).await.1);
    }
    drop(receivers.remove(2));

    let report = h.dispatcher.broadcast(OutboundResponse::error(0, "server restarting"));
    assert_eq!(report.delivered, 4);
    assert_eq!(report.failed, 1);

    for rx in &mut receivers {
        assert!(rx.try_recv().is_ok());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_each_get_their_own_game() {
    let h = Arc::new(harness(1));
    let mut tasks = Vec::new();

    for i in 0..32 {
        let h = Arc::clone(&h);
        tasks.push(tokio::spawn(async move {
            let session = SessionId::from(format!("S{i}"));
            let (conn, mut rx) = connect(&h, session.as_str()).await;
            h.router.route(&session, InboundMessage::CreateGame).await;
            let response = rx.recv().await.unwrap();
            h.lifecycle.on_disconnect(&conn).await;
            match &*response {
                OutboundResponse::Game { game } => {
                    assert_eq!(game.as_value()["owner"], session.as_str());
                    game.as_value()["id"].as_i64().unwrap()
                }
                other => panic!("Expected game response, got {:?}", other),
            }
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 32);
    assert!(h.registry.is_empty());
}
