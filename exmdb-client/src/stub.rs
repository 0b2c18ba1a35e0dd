//! Scripted loopback servers for tests.

use crate::config::ClientConfig;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

async fn read_frame(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut prefix = [0u8; 4];
    socket.read_exact(&mut prefix).await.ok()?;
    let mut body = vec![0u8; u32::from_le_bytes(prefix) as usize];
    socket.read_exact(&mut body).await.ok()?;
    Some(body)
}

/// Accepts one connection, answers each incoming frame with the next reply,
/// then closes. Returns the received frame bodies.
pub(crate) async fn spawn_stub(
    replies: Vec<Vec<u8>>,
) -> (ClientConfig, JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        for reply in replies {
            let Some(frame) = read_frame(&mut socket).await else {
                break;
            };
            received.push(frame);
            socket.write_all(&reply).await.unwrap();
        }
        received
    });
    (ClientConfig::new("127.0.0.1", port), handle)
}

/// Like [`spawn_stub`], but writes each reply in chunks with a pause between them.
pub(crate) async fn spawn_chunked_stub(
    replies: Vec<Vec<Vec<u8>>>,
    pause: Duration,
) -> (ClientConfig, JoinHandle<usize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut answered = 0;
        for chunks in replies {
            if read_frame(&mut socket).await.is_none() {
                break;
            }
            for (i, chunk) in chunks.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(pause).await;
                }
                if socket.write_all(chunk).await.is_err() {
                    return answered;
                }
            }
            answered += 1;
        }
        answered
    });
    (ClientConfig::new("127.0.0.1", port), handle)
}

pub(crate) fn success(payload: &[u8]) -> Vec<u8> {
    let mut reply = vec![0x00];
    reply.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    reply.extend_from_slice(payload);
    reply
}

/// Accepts one connection and reads frames without ever replying until released.
pub(crate) async fn spawn_silent_stub() -> (ClientConfig, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (release, released) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _ = read_frame(&mut socket).await;
        let _ = released.await;
    });
    (ClientConfig::new("127.0.0.1", port), release)
}
