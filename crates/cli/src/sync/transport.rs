// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket adapter for the kp-remote document service.
//!
//! One background task owns the socket. It multiplexes:
//! - outgoing requests from any number of callers
//! - replies, matched to waiting callers by request id
//! - pushed snapshots, routed to feeds by subscription id
//! - optional keepalive pings

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use kp_core::protocol::{ClientMessage, ErrorKind, ServerMessage};
use kp_core::{Collection, Document, Fields};

use super::remote::{RemoteCollections, RemoteError, RemoteFeed, RemoteFuture, RemoteResult};

/// Configuration for the WebSocket adapter.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// URL of the remote server.
    pub url: String,
    /// Max time to wait for the initial connection.
    pub connect_timeout: Duration,
    /// Max time to wait for a write to be acknowledged.
    pub request_timeout: Duration,
    /// Keepalive ping interval. `None` disables pings.
    pub heartbeat_interval: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            url: "ws://localhost:7890".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            heartbeat_interval: Some(Duration::from_secs(30)),
        }
    }
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;
type Pending = HashMap<u64, oneshot::Sender<ServerMessage>>;
type Feeds = HashMap<u64, mpsc::UnboundedSender<Vec<Document>>>;

/// State shared between callers and the connection task.
#[derive(Default)]
struct Shared {
    pending: Mutex<Pending>,
    feeds: Mutex<Feeds>,
    connected: AtomicBool,
}

impl Shared {
    /// Mark the connection closed, then fail every waiting caller.
    ///
    /// Callers re-check `connected` after registering, so nothing registered
    /// after the clear can wait forever.
    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        // Dropping the senders fails waiting callers and ends every feed
        lock(&self.pending).clear();
        lock(&self.feeds).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Remote collections reached over a WebSocket connection.
pub struct WsRemote {
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    request_timeout: Duration,
}

impl WsRemote {
    /// Connect to a kp-remote server and start the connection task.
    pub async fn connect(config: &SyncConfig) -> RemoteResult<Self> {
        let (ws_stream, _) =
            tokio::time::timeout(config.connect_timeout, tokio_tungstenite::connect_async(&config.url))
                .await
                .map_err(|_| RemoteError::ConnectionFailed(format!("timed out connecting to {}", config.url)))?
                .map_err(|e| RemoteError::ConnectionFailed(e.to_string()))?;
        info!("Connected to {}", config.url);

        let shared = Arc::new(Shared::default());
        shared.connected.store(true, Ordering::SeqCst);

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(
            ws_stream,
            outgoing_rx,
            Arc::clone(&shared),
            config.heartbeat_interval,
        ));

        Ok(WsRemote {
            outgoing,
            shared,
            next_id: AtomicU64::new(1),
            request_timeout: config.request_timeout,
        })
    }

    /// A handle wired to a channel instead of a socket.
    #[cfg(test)]
    pub(crate) fn detached(
        request_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ClientMessage>, DetachedLink) {
        let shared = Arc::new(Shared::default());
        shared.connected.store(true, Ordering::SeqCst);
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let remote = WsRemote {
            outgoing,
            shared: Arc::clone(&shared),
            next_id: AtomicU64::new(1),
            request_timeout,
        };
        (remote, outgoing_rx, DetachedLink { shared })
    }

    /// Check if the connection task is still running.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Send a write and wait for its reply.
    async fn request(&self, build: impl FnOnce(u64) -> ClientMessage) -> RemoteResult<ServerMessage> {
        if !self.is_connected() {
            return Err(RemoteError::ConnectionClosed);
        }

        let req_id = self.next_id();
        let (tx, rx) = oneshot::channel();
        lock(&self.shared.pending).insert(req_id, tx);
        // The connection task may have cleared pending before the insert
        if !self.is_connected() {
            lock(&self.shared.pending).remove(&req_id);
            return Err(RemoteError::ConnectionClosed);
        }

        if self.outgoing.send(build(req_id)).is_err() {
            lock(&self.shared.pending).remove(&req_id);
            return Err(RemoteError::ConnectionClosed);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(reply)) => match reply {
                ServerMessage::Error { kind, message, .. } => Err(match kind {
                    ErrorKind::NotFound => RemoteError::NotFound(message),
                    ErrorKind::Invalid | ErrorKind::Forbidden => RemoteError::Rejected(message),
                    ErrorKind::Internal => RemoteError::ConnectionFailed(message),
                }),
                other => Ok(other),
            },
            // Sender dropped: the connection task ended
            Ok(Err(_)) => Err(RemoteError::ConnectionClosed),
            Err(_) => {
                lock(&self.shared.pending).remove(&req_id);
                Err(RemoteError::Timeout)
            }
        }
    }
}

impl RemoteCollections for WsRemote {
    fn subscribe(&self, collection: Collection, owner_id: &str) -> RemoteResult<RemoteFeed> {
        if !self.is_connected() {
            return Err(RemoteError::ConnectionClosed);
        }

        let sub_id = self.next_id();
        let (tx, documents) = mpsc::unbounded_channel();
        lock(&self.shared.feeds).insert(sub_id, tx);
        if !self.is_connected() {
            lock(&self.shared.feeds).remove(&sub_id);
            return Err(RemoteError::ConnectionClosed);
        }

        if self
            .outgoing
            .send(ClientMessage::subscribe(sub_id, collection, owner_id))
            .is_err()
        {
            lock(&self.shared.feeds).remove(&sub_id);
            return Err(RemoteError::ConnectionClosed);
        }

        debug!("Subscribed {} to {}/{}", sub_id, collection, owner_id);
        Ok(RemoteFeed {
            id: sub_id,
            documents,
        })
    }

    fn unsubscribe(&self, id: u64) {
        if lock(&self.shared.feeds).remove(&id).is_some() {
            // Nothing to tell a closed connection
            let _ = self.outgoing.send(ClientMessage::unsubscribe(id));
            debug!("Unsubscribed {}", id);
        }
    }

    fn create(
        &self,
        collection: Collection,
        owner_id: &str,
        fields: Fields,
    ) -> RemoteFuture<'_, String> {
        let owner_id = owner_id.to_string();
        Box::pin(async move {
            let reply = self
                .request(|req_id| ClientMessage::Create {
                    req_id,
                    collection,
                    owner_id,
                    fields,
                })
                .await?;
            match reply {
                ServerMessage::Created { key, .. } => Ok(key),
                other => Err(RemoteError::Rejected(format!("unexpected reply: {other:?}"))),
            }
        })
    }

    fn update(
        &self,
        collection: Collection,
        owner_id: &str,
        key: &str,
        fields: Fields,
    ) -> RemoteFuture<'_, ()> {
        let owner_id = owner_id.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.request(|req_id| ClientMessage::Update {
                req_id,
                collection,
                owner_id,
                key,
                fields,
            })
            .await
            .map(|_| ())
        })
    }

    fn delete(&self, collection: Collection, owner_id: &str, key: &str) -> RemoteFuture<'_, ()> {
        let owner_id = owner_id.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.request(|req_id| ClientMessage::Delete {
                req_id,
                collection,
                owner_id,
                key,
            })
            .await
            .map(|_| ())
        })
    }
}

/// The connection-task side of a [`WsRemote::detached`] handle.
#[cfg(test)]
pub(crate) struct DetachedLink {
    shared: Arc<Shared>,
}

#[cfg(test)]
impl DetachedLink {
    pub(crate) fn deliver(&self, msg: ServerMessage) {
        dispatch(&self.shared, msg);
    }

    pub(crate) fn disconnect(&self) {
        self.shared.disconnect();
    }
}

/// Route one server message to whoever is waiting for it.
fn dispatch(shared: &Shared, msg: ServerMessage) {
    match msg {
        ServerMessage::Snapshot { sub_id, documents } => {
            let mut feeds = lock(&shared.feeds);
            if let Some(tx) = feeds.get(&sub_id) {
                if tx.send(documents).is_err() {
                    feeds.remove(&sub_id);
                }
            } else {
                debug!("Dropping snapshot for released subscription {}", sub_id);
            }
        }
        ServerMessage::Created { req_id, .. } | ServerMessage::Ack { req_id } => {
            reply(shared, req_id, msg);
        }
        ServerMessage::Error {
            req_id: Some(req_id),
            ..
        } => reply(shared, req_id, msg),
        ServerMessage::Error {
            req_id: None,
            sub_id: Some(sub_id),
            message,
            ..
        } => {
            warn!("Subscription {} refused: {}", sub_id, message);
            // Dropping the sender ends the feed
            lock(&shared.feeds).remove(&sub_id);
        }
        ServerMessage::Error {
            req_id: None,
            sub_id: None,
            message,
            ..
        } => warn!("Server error: {}", message),
        ServerMessage::Pong { id } => debug!("Pong received: {}", id),
    }
}

fn reply(shared: &Shared, req_id: u64, msg: ServerMessage) {
    match lock(&shared.pending).remove(&req_id) {
        // Receiver gone: the caller timed out or went away
        Some(tx) => {
            let _ = tx.send(msg);
        }
        None => debug!("Late reply for request {}", req_id),
    }
}

/// Own the socket until either side closes it.
async fn run_connection(
    ws_stream: WsStream,
    mut outgoing_rx: mpsc::UnboundedReceiver<ClientMessage>,
    shared: Arc<Shared>,
    heartbeat_interval: Option<Duration>,
) {
    let (mut sink, mut stream) = ws_stream.split();
    let mut heartbeat = heartbeat_interval.map(tokio::time::interval);
    let mut ping_id: u64 = 0;

    loop {
        tokio::select! {
            msg = outgoing_rx.recv() => {
                let Some(msg) = msg else {
                    // Every WsRemote handle is gone
                    let _ = sink.close().await;
                    break;
                };
                let json = match msg.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to encode request: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    warn!("Send failed: {}", e);
                    break;
                }
            }

            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => match ServerMessage::from_json(&text) {
                        Ok(msg) => dispatch(&shared, msg),
                        Err(e) => warn!("Ignoring malformed server message: {}", e),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ignore ping/pong and binary frames
                    }
                    Some(Err(e)) => {
                        warn!("Receive failed: {}", e);
                        break;
                    }
                }
            }

            _ = async {
                match heartbeat.as_mut() {
                    Some(interval) => { interval.tick().await; }
                    None => std::future::pending::<()>().await,
                }
            } => {
                ping_id += 1;
                let json = match ClientMessage::ping(ping_id).to_json() {
                    Ok(json) => json,
                    Err(_) => continue,
                };
                if let Err(e) = sink.send(Message::Text(json.into())).await {
                    warn!("Heartbeat failed: {}", e);
                    break;
                }
            }
        }
    }

    shared.disconnect();
}
