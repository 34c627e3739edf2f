// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::io::AsyncReadExt;
use tokio::net::UnixListener;

async fn listener_pair(dir: &tempfile::TempDir) -> (SocketHost, mpsc::Receiver<Notification>, UnixStream) {
    let path = dir.path().join("host.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let connect = SocketHost::connect(&path);
    let (accepted, connected) = tokio::join!(listener.accept(), connect);
    let (host, notifications) = connected.unwrap();
    (host, notifications, accepted.unwrap().0)
}

async fn read_request(server: &mut UnixStream) -> Value {
    let mut buf = vec![0u8; 4096];
    let n = server.read(&mut buf).await.unwrap();
    serde_json::from_slice(&buf[..n]).unwrap()
}

#[tokio::test]
async fn request_round_trips_result() {
    let dir = tempfile::tempdir().unwrap();
    let (host, _notifications, mut server) = listener_pair(&dir).await;

    let request = tokio::spawn(async move {
        host.request("JSONRPC.Ping", json!({})).await
    });

    let sent = read_request(&mut server).await;
    assert_eq!(sent["method"], "JSONRPC.Ping");
    let id = sent["id"].as_u64().unwrap();

    let reply = format!("{{\"jsonrpc\":\"2.0\",\"id\":{id},\"result\":\"pong\"}}\n");
    server.write_all(reply.as_bytes()).await.unwrap();

    assert_eq!(request.await.unwrap().unwrap(), json!("pong"));
}

#[tokio::test]
async fn host_error_objects_become_request_errors() {
    let dir = tempfile::tempdir().unwrap();
    let (host, _notifications, mut server) = listener_pair(&dir).await;

    let request = tokio::spawn(async move {
        host.request("VideoLibrary.GetMovies", json!({})).await
    });

    let sent = read_request(&mut server).await;
    let id = sent["id"].as_u64().unwrap();
    let reply = format!(
        "{{\"jsonrpc\":\"2.0\",\"id\":{id},\"error\":{{\"code\":-32601,\"message\":\"Method not found\"}}}}\n"
    );
    server.write_all(reply.as_bytes()).await.unwrap();

    match request.await.unwrap() {
        Err(RequestError::Host { code, message, .. }) => {
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found");
        }
        other => panic!("expected host error, got {other:?}"),
    }
}

#[tokio::test]
async fn idless_messages_arrive_as_notifications() {
    let dir = tempfile::tempdir().unwrap();
    let (_host, mut notifications, mut server) = listener_pair(&dir).await;

    // Host's own event: method passes through untouched.
    server
        .write_all(
            b"{\"jsonrpc\":\"2.0\",\"method\":\"Player.OnStop\",\"params\":{\"sender\":\"xbmc\",\"data\":{}}}\n",
        )
        .await
        .unwrap();
    let note = notifications.recv().await.unwrap();
    assert_eq!(note.method, "Player.OnStop");

    // Another sender: delivered in the Other.-prefixed receive form.
    server
        .write_all(
            b"{\"jsonrpc\":\"2.0\",\"method\":\"nfosync.SyncAll\",\"params\":{\"sender\":\"nfosync\",\"data\":{\"patient\":true}}}\n",
        )
        .await
        .unwrap();
    let note = notifications.recv().await.unwrap();
    assert_eq!(note.method, "Other.nfosync.SyncAll");
    assert_eq!(note.data["patient"], true);
}

#[tokio::test]
async fn hangup_fails_pending_requests() {
    let dir = tempfile::tempdir().unwrap();
    let (host, _notifications, server) = listener_pair(&dir).await;

    let request = tokio::spawn(async move {
        host.request("JSONRPC.Ping", json!({})).await
    });

    // Give the request a moment to register, then hang up.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    drop(server);

    assert!(matches!(
        request.await.unwrap(),
        Err(RequestError::Transport { .. })
    ));
}
