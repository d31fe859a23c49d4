use jokeserver::client::fetch_item;
use jokeserver::config::InstanceRole;
use jokeserver::content::Category;
use jokeserver::dispenser::session::SessionToken;
use std::collections::HashSet;
mod common;
use common::{spawn_server, CLIENT_TIMEOUT};

#[tokio::test]
async fn four_requests_cover_every_joke_then_repeat() {
    let server = spawn_server(InstanceRole::Primary).await;
    let jokes: HashSet<&str> = ["JA", "JB", "JC", "JD"].into_iter().collect();

    let mut seen = HashSet::new();
    for _ in 0..4 {
        let item = fetch_item(server.content, SessionToken(42), "Alice", CLIENT_TIMEOUT)
            .await
            .expect("fetch");
        assert!(jokes.contains(item.label.as_str()), "unexpected label {}", item.label);
        assert_eq!(
            Some(item.text.as_str()),
            server.state.table.text(Category::Joke, &item.label)
        );
        assert!(seen.insert(item.label.clone()), "repeat before full cycle: {}", item.label);
    }
    assert_eq!(seen.len(), 4);

    let fifth = fetch_item(server.content, SessionToken(42), "Alice", CLIENT_TIMEOUT)
        .await
        .expect("fifth fetch");
    assert!(jokes.contains(fifth.label.as_str()));

    let snap = server.state.metrics.snapshot();
    assert_eq!(snap.sessions_created, 1);
    assert_eq!(snap.cycles_completed, 1);
    assert_eq!(server.state.store.len(), 1);
}

#[tokio::test]
async fn sessions_rotate_independently() {
    let server = spawn_server(InstanceRole::Primary).await;
    let mut a = HashSet::new();
    let mut b = HashSet::new();
    // Interleave two tokens; each must still see its own full cycle.
    for _ in 0..4 {
        a.insert(
            fetch_item(server.content, SessionToken(1), "a", CLIENT_TIMEOUT)
                .await
                .unwrap()
                .label,
        );
        b.insert(
            fetch_item(server.content, SessionToken(2), "b", CLIENT_TIMEOUT)
                .await
                .unwrap()
                .label,
        );
    }
    assert_eq!(a.len(), 4);
    assert_eq!(b.len(), 4);
    assert_eq!(server.state.store.len(), 2);
}

#[tokio::test]
async fn display_name_does_not_affect_rotation() {
    let server = spawn_server(InstanceRole::Primary).await;
    let mut seen = HashSet::new();
    for name in ["Alice", "alice", "", "Mallory\tthe\\great"] {
        let item = fetch_item(server.content, SessionToken(77), name, CLIENT_TIMEOUT)
            .await
            .unwrap();
        seen.insert(item.label);
    }
    assert_eq!(seen.len(), 4);
    assert_eq!(server.state.store.len(), 1);
}
