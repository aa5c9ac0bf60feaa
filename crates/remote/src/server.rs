// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Handles client connections, request routing and snapshot fanout. Each
//! connection tracks its own subscriptions; a change notice for a
//! (collection, owner) pair re-sends the full document list to every
//! matching subscription.

use std::collections::HashMap;
use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use kp_core::protocol::{ClientMessage, ErrorKind, ServerMessage};
use kp_core::Collection;

use crate::state::{Change, ServerState};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Subscriptions of one connection, keyed by client-chosen id.
pub(crate) type Subscriptions = HashMap<u64, (Collection, String)>;

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), BoxError> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);
    serve(listener, state).await
}

/// Accept connections from an already bound listener.
pub async fn serve(listener: TcpListener, state: ServerState) -> Result<(), BoxError> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), BoxError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    // Subscribe to change notices before serving any request
    let mut changes_rx = state.subscribe();
    let mut subscriptions = Subscriptions::new();

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let replies = handle_client_message(&text, &state, &mut subscriptions).await;
                        for reply in replies {
                            ws_sink.send(Message::Text(reply.to_json()?.into())).await?;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", peer_addr);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(_)) => {
                        // Ignore other message types (Binary, Pong, Frame)
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                    None => {
                        info!("Client {} stream ended", peer_addr);
                        break;
                    }
                }
            }

            // Push fresh snapshots for changed subscriptions
            change = changes_rx.recv() => {
                let snapshots = match change {
                    Ok(change) => snapshots_for(&state, &subscriptions, Some(&change)).await,
                    Err(RecvError::Lagged(n)) => {
                        // Missed notices: resend everything
                        warn!("Client {} lagged by {} changes", peer_addr, n);
                        snapshots_for(&state, &subscriptions, None).await
                    }
                    Err(RecvError::Closed) => break,
                };
                for msg in snapshots {
                    if let Err(e) = ws_sink.send(Message::Text(msg.to_json()?.into())).await {
                        warn!("Failed to send snapshot to {}: {}", peer_addr, e);
                        return Ok(());
                    }
                }
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Build snapshots for the subscriptions matching a change, or all of them.
async fn snapshots_for(
    state: &ServerState,
    subscriptions: &Subscriptions,
    change: Option<&Change>,
) -> Vec<ServerMessage> {
    let mut ids: Vec<u64> = subscriptions
        .iter()
        .filter(|(_, (collection, owner_id))| match change {
            Some(c) => c.collection == *collection && c.owner_id == *owner_id,
            None => true,
        })
        .map(|(id, _)| *id)
        .collect();
    ids.sort_unstable();

    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let Some((collection, owner_id)) = subscriptions.get(&id) else {
            continue;
        };
        match state.documents(*collection, owner_id).await {
            Ok(documents) => out.push(ServerMessage::snapshot(id, documents)),
            Err(e) => error!("Failed to load {} for {}: {}", collection, owner_id, e),
        }
    }
    out
}

/// Process a client message and return the replies to send back.
pub(crate) async fn handle_client_message(
    text: &str,
    state: &ServerState,
    subscriptions: &mut Subscriptions,
) -> Vec<ServerMessage> {
    let msg = match ClientMessage::from_json(text) {
        Ok(msg) => msg,
        Err(e) => {
            return vec![ServerMessage::error(
                None,
                ErrorKind::Invalid,
                format!("malformed message: {e}"),
            )]
        }
    };
    debug!("Received message: {:?}", msg);

    match msg {
        ClientMessage::Subscribe {
            sub_id,
            collection,
            owner_id,
        } => {
            if owner_id.trim().is_empty() {
                return vec![ServerMessage::subscription_error(
                    sub_id,
                    ErrorKind::Invalid,
                    "subscribe requires an owner_id",
                )];
            }
            match state.documents(collection, &owner_id).await {
                Ok(documents) => {
                    debug!(
                        "Subscription {} on {}/{}: {} documents",
                        sub_id,
                        collection,
                        owner_id,
                        documents.len()
                    );
                    subscriptions.insert(sub_id, (collection, owner_id));
                    vec![ServerMessage::snapshot(sub_id, documents)]
                }
                Err(e) => vec![ServerMessage::subscription_error(
                    sub_id,
                    ErrorKind::from(&e),
                    e.to_string(),
                )],
            }
        }

        ClientMessage::Unsubscribe { sub_id } => {
            subscriptions.remove(&sub_id);
            debug!("Subscription {} released", sub_id);
            Vec::new()
        }

        ClientMessage::Create {
            req_id,
            collection,
            owner_id,
            fields,
        } => match state.create(collection, &owner_id, fields).await {
            Ok(key) => vec![ServerMessage::created(req_id, key)],
            Err(e) => vec![ServerMessage::error(Some(req_id), ErrorKind::from(&e), e.to_string())],
        },

        ClientMessage::Update {
            req_id,
            collection,
            owner_id,
            key,
            fields,
        } => match state.update(collection, &owner_id, &key, fields).await {
            Ok(()) => vec![ServerMessage::ack(req_id)],
            Err(e) => vec![ServerMessage::error(Some(req_id), ErrorKind::from(&e), e.to_string())],
        },

        ClientMessage::Delete {
            req_id,
            collection,
            owner_id,
            key,
        } => match state.delete(collection, &owner_id, &key).await {
            Ok(removed) => {
                if !removed {
                    debug!("Delete of missing key {} acknowledged", key);
                }
                vec![ServerMessage::ack(req_id)]
            }
            Err(e) => vec![ServerMessage::error(Some(req_id), ErrorKind::from(&e), e.to_string())],
        },

        ClientMessage::Ping { id } => {
            debug!("Ping received: {}", id);
            vec![ServerMessage::pong(id)]
        }
    }
}
