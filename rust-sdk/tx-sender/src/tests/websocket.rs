use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use super::rpc::MOCK_SLOT;

const SUBSCRIPTION_ID: u64 = 42;

/// Minimal `signatureSubscribe` endpoint
///
/// Acknowledges every subscription, then pushes `notification` (the
/// `value` of a `signatureNotification`) if one is scripted.
pub struct MockWebsocket {
    pub url: String,
    unsubscribes: Arc<AtomicUsize>,
}

impl MockWebsocket {
    pub async fn start(notification: Option<Value>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let unsubscribes = Arc::new(AtomicUsize::new(0));

        let counter = unsubscribes.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                serve(stream, notification.clone(), counter.clone()).await;
            }
        });

        Self { url, unsubscribes }
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }
}

async fn serve(stream: TcpStream, notification: Option<Value>, unsubscribes: Arc<AtomicUsize>) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };

    while let Some(Ok(message)) = ws.next().await {
        // Close frames are answered by the stream itself
        let Message::Text(text) = message else {
            continue;
        };
        let request: Value = serde_json::from_str(&text).unwrap();
        let id = request["id"].clone();

        let mut replies = Vec::new();
        match request["method"].as_str() {
            Some("signatureSubscribe") => {
                replies.push(json!({ "jsonrpc": "2.0", "result": SUBSCRIPTION_ID, "id": id }));
                if let Some(value) = &notification {
                    replies.push(json!({
                        "jsonrpc": "2.0",
                        "method": "signatureNotification",
                        "params": {
                            "result": { "context": { "slot": MOCK_SLOT }, "value": value },
                            "subscription": SUBSCRIPTION_ID,
                        },
                    }));
                }
            }
            Some("signatureUnsubscribe") => {
                unsubscribes.fetch_add(1, Ordering::SeqCst);
                replies.push(json!({ "jsonrpc": "2.0", "result": true, "id": id }));
            }
            _ => {}
        }

        for reply in replies {
            if ws.send(Message::Text(reply.to_string())).await.is_err() {
                return;
            }
        }
    }
}

/// Accepts TCP connections and never completes the websocket handshake
pub async fn start_silent_listener() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    url
}
