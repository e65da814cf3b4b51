//! Relay fan-out integration tests
//!
//! Exercises the store → registry pipeline through `AppState`, the same path
//! the HTTP handlers and the push endpoint use.

use drumhud_relay::{
    AppState, ProjectId, PushMessage, RelayServer, ServerConfig, StateStore, TransportState,
};

fn app() -> AppState {
    RelayServer::new(ServerConfig::default(), StateStore::new())
        .app_state()
        .clone()
}

fn sample_state(bar: u32) -> TransportState {
    TransportState {
        playing: true,
        bar,
        beat: 2,
        bpm: 128.0,
        ppq: 1536.0,
        ..TransportState::default()
    }
}

#[tokio::test]
async fn snapshot_equals_state_at_connect_time() {
    let app = app();
    let accepted = app.apply_state(sample_state(5)).await.unwrap();

    let (_h, _rx, snapshot) = app.connect_subscriber().await;

    assert_eq!(snapshot, vec![PushMessage::State(accepted)]);
}

#[tokio::test]
async fn snapshot_comes_before_any_broadcast() {
    let app = app();
    app.apply_state(sample_state(1)).await.unwrap();

    let (_h, mut rx, snapshot) = app.connect_subscriber().await;
    app.apply_state(sample_state(2)).await.unwrap();

    // The channel only carries post-registration broadcasts; the snapshot is
    // handed over separately and reflects bar 1
    assert_eq!(snapshot.len(), 1);
    assert!(matches!(&snapshot[0], PushMessage::State(s) if s.bar == 1));
    assert!(matches!(rx.recv().await.unwrap(), PushMessage::State(s) if s.bar == 2));
}

#[tokio::test]
async fn one_update_reaches_all_subscribers_identically() {
    let app = app();
    let mut receivers = Vec::new();
    for _ in 0..8 {
        let (_h, rx, _snapshot) = app.connect_subscriber().await;
        receivers.push(rx);
    }

    let accepted = app.apply_state(sample_state(7)).await.unwrap();

    let mut payloads = Vec::new();
    for rx in &mut receivers {
        let message = rx.recv().await.unwrap();
        payloads.push(message.to_text().unwrap());
        assert_eq!(message, PushMessage::State(accepted));
    }

    // Byte-identical payloads across all subscribers
    assert!(payloads.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn disconnect_during_broadcasts_does_not_disturb_the_rest() {
    let app = app();
    let (h1, rx1, _s1) = app.connect_subscriber().await;
    let (_h2, mut rx2, _s2) = app.connect_subscriber().await;

    // One subscriber vanishes mid-stream
    drop(rx1);

    for bar in 1..=3 {
        // Producer never sees an error from the dead subscriber
        app.apply_state(sample_state(bar)).await.unwrap();
    }

    for bar in 1..=3 {
        assert!(matches!(rx2.recv().await.unwrap(), PushMessage::State(s) if s.bar == bar));
    }

    // The racing explicit unregister is a harmless no-op
    app.registry().unregister(h1).await;
    assert_eq!(app.registry().subscriber_count().await, 1);
}

#[tokio::test]
async fn concurrent_posts_reach_every_subscriber_in_one_order() {
    let app = app();
    let (_h, mut rx, _snapshot) = app.connect_subscriber().await;

    let mut tasks = Vec::new();
    for bar in 1..=20 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            app.apply_state(sample_state(bar)).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Whatever order the posts serialized in, the subscriber sees all twenty
    // and the last one received matches the stored state
    let mut last = None;
    for _ in 0..20 {
        match rx.recv().await.unwrap() {
            PushMessage::State(s) => last = Some(s),
            other => panic!("unexpected message {other:?}"),
        }
    }
    assert_eq!(last.unwrap(), app.store().state().await);
}

#[tokio::test]
async fn selection_and_state_share_the_channel() {
    let app = app();
    let (_h, mut rx, _snapshot) = app.connect_subscriber().await;

    app.apply_selection(ProjectId::parse("song-2").unwrap())
        .await
        .unwrap();
    app.apply_state(sample_state(1)).await.unwrap();

    assert!(matches!(
        rx.recv().await.unwrap(),
        PushMessage::Selection { ref project_id } if project_id.as_str() == "song-2"
    ));
    assert!(matches!(rx.recv().await.unwrap(), PushMessage::State(_)));
}

#[tokio::test]
async fn late_joiner_snapshot_carries_selection() {
    let app = app();
    app.apply_selection(ProjectId::parse("song-3").unwrap())
        .await
        .unwrap();
    app.apply_state(sample_state(9)).await.unwrap();

    let (_h, _rx, snapshot) = app.connect_subscriber().await;

    assert_eq!(snapshot.len(), 2);
    assert!(matches!(&snapshot[0], PushMessage::State(s) if s.bar == 9));
    assert!(matches!(
        &snapshot[1],
        PushMessage::Selection { project_id } if project_id.as_str() == "song-3"
    ));
}

#[tokio::test]
async fn every_tick_is_broadcast_even_when_unchanged() {
    let app = app();
    let (_h, mut rx, _snapshot) = app.connect_subscriber().await;

    // Identical payload posted twice still goes out twice
    app.apply_state(sample_state(4)).await.unwrap();
    app.apply_state(sample_state(4)).await.unwrap();

    assert!(matches!(rx.recv().await.unwrap(), PushMessage::State(s) if s.bar == 4));
    assert!(matches!(rx.recv().await.unwrap(), PushMessage::State(s) if s.bar == 4));
}
