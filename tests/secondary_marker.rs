use jokeserver::client::{fetch_item, toggle_mode};
use jokeserver::config::InstanceRole;
use jokeserver::dispenser::mode::Mode;
use jokeserver::dispenser::session::SessionToken;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
mod common;
use common::{spawn_server, CLIENT_TIMEOUT};

#[tokio::test]
async fn secondary_tags_label_line_and_primary_does_not() {
    let primary = spawn_server(InstanceRole::Primary).await;
    let secondary = spawn_server(InstanceRole::Secondary).await;

    let p = fetch_item(primary.content, SessionToken(1), "x", CLIENT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(p.marker, None);
    assert!(!p.is_secondary());

    let s = fetch_item(secondary.content, SessionToken(1), "x", CLIENT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(s.marker.as_deref(), Some("<S2>"));
    assert!(s.label.starts_with('J'));
}

#[tokio::test]
async fn raw_wire_format_of_secondary() {
    let secondary = spawn_server(InstanceRole::Secondary).await;
    let mut stream = tokio::net::TcpStream::connect(secondary.content).await.unwrap();
    stream.write_all(b"42\nAlice\n").await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines.len(), 2, "raw response: {raw:?}");
    let label = lines[0].strip_prefix("<S2> ").expect("marker on label line");
    assert!(["JA", "JB", "JC", "JD"].contains(&label));
    assert!(!lines[1].starts_with("<S2>"));
}

#[tokio::test]
async fn instances_keep_separate_state() {
    let primary = spawn_server(InstanceRole::Primary).await;
    let secondary = spawn_server(InstanceRole::Secondary).await;

    toggle_mode(secondary.admin, CLIENT_TIMEOUT).await.unwrap();
    assert_eq!(secondary.state.mode.current(), Mode::Proverb);
    assert_eq!(primary.state.mode.current(), Mode::Joke);

    fetch_item(primary.content, SessionToken(9), "x", CLIENT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(primary.state.store.len(), 1);
    assert!(secondary.state.store.is_empty());
}
