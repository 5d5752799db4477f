use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        mpsc,
    },
    task::JoinHandle,
    time::{Instant, timeout_at},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    error::ServiceError,
    services::{membership_service, playback_service, queue_service, sync_service},
    state::{SharedState, registry::Room},
};

/// Frames buffered between a connection's producers and its socket writer.
///
/// Once full, the room forwarder stops draining its broadcast receiver, so a
/// stalled socket lags at the broadcast layer instead of growing memory.
const OUTBOUND_CAPACITY: usize = 32;

/// Internal error type for listener session handling.
#[derive(Debug, Error)]
enum SessionError {
    /// Writer channel closed; the connection should be terminated immediately.
    #[error("connection closed")]
    ConnectionClosed,
    /// A room operation failed; reported back to the client.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Membership acquired by a successful `join`.
struct Session {
    room_id: String,
    forwarder: JoinHandle<()>,
}

/// Handle the full lifecycle of one listener WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_CAPACITY);

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    if let Some(session) = await_join(&state, &connection_id, &mut receiver, &outbound_tx).await {
        run_session(&state, &connection_id, session, &mut receiver, &outbound_tx).await;
    }

    finalize(writer_task, outbound_tx).await;
}

/// Wait for the `join` frame, answering pings meanwhile.
///
/// Returns `None` when the socket should be closed without a session.
async fn await_join<S>(
    state: &SharedState,
    connection_id: &str,
    receiver: &mut S,
    outbound_tx: &mpsc::Sender<Message>,
) -> Option<Session>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let deadline = Instant::now() + state.config().join_timeout;

    loop {
        let text = match timeout_at(deadline, receiver.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => text,
            Ok(Some(Ok(Message::Ping(payload)))) => {
                let _ = outbound_tx.send(Message::Pong(payload)).await;
                continue;
            }
            Ok(Some(Ok(Message::Pong(_)))) => continue,
            Ok(Some(Ok(Message::Close(_)))) => return None,
            Ok(Some(Ok(Message::Binary(_)))) => {
                let _ = outbound_tx.send(Message::Close(None)).await;
                return None;
            }
            Ok(Some(Err(err))) => {
                warn!(error = %err, "websocket receive error");
                return None;
            }
            Ok(None) => return None,
            Err(_) => {
                warn!(connection_id, "websocket join timed out");
                let _ = outbound_tx.send(Message::Close(None)).await;
                return None;
            }
        };

        let (room_id, display_name, device) = match ClientMessage::from_json_str(&text) {
            Ok(ClientMessage::Join {
                room_id,
                display_name,
                device,
            }) => (room_id, display_name, device),
            Ok(ClientMessage::Ping) => {
                if send_message(outbound_tx, &sync_service::pong(state))
                    .await
                    .is_err()
                {
                    return None;
                }
                continue;
            }
            Ok(_) => {
                warn!(connection_id, "first message was not join");
                reject(outbound_tx, "join a room first").await;
                return None;
            }
            Err(err) => {
                warn!(connection_id, error = %err, "failed to parse or validate join");
                reject(outbound_tx, &err.to_string()).await;
                return None;
            }
        };

        let joined = match membership_service::join(
            state,
            &room_id,
            connection_id,
            display_name,
            device,
        )
        .await
        {
            Ok(joined) => joined,
            Err(err) => {
                warn!(connection_id, room_id = %room_id, error = %err, "join rejected");
                reject(outbound_tx, &err.to_string()).await;
                return None;
            }
        };

        let direct = [
            ServerMessage::RoomState {
                room: joined.snapshot,
            },
            joined.queue_update,
        ];
        for message in &direct {
            if send_message(outbound_tx, message).await.is_err() {
                // Joined but already gone; undo the membership.
                let _ = membership_service::leave(state, &room_id, connection_id).await;
                return None;
            }
        }

        let forwarder = spawn_forwarder(
            state.clone(),
            joined.room,
            joined.receiver,
            outbound_tx.clone(),
        );
        return Some(Session { room_id, forwarder });
    }
}

/// Serve a joined connection until it closes, then leave its room.
async fn run_session<S>(
    state: &SharedState,
    connection_id: &str,
    session: Session,
    receiver: &mut S,
    outbound_tx: &mpsc::Sender<Message>,
) where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let inbound = match ClientMessage::from_json_str(&text) {
                    Ok(inbound) => inbound,
                    Err(err) => {
                        warn!(connection_id, error = %err, "rejected client message");
                        if send_message(outbound_tx, &ServerMessage::error(err.to_string()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                        continue;
                    }
                };

                match dispatch(state, &session.room_id, inbound, outbound_tx).await {
                    Ok(()) => {}
                    Err(SessionError::ConnectionClosed) => {
                        info!(connection_id, "connection closed while replying, terminating");
                        break;
                    }
                    Err(SessionError::Service(err)) => {
                        warn!(connection_id, error = %err, "room operation failed");
                        if send_message(outbound_tx, &ServerMessage::error(err.to_string()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload)).await;
            }
            Ok(Message::Close(frame)) => {
                info!(connection_id, "listener closed");
                let _ = outbound_tx.send(Message::Close(frame)).await;
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    session.forwarder.abort();
    let _ = session.forwarder.await;
    if let Err(err) = membership_service::leave(state, &session.room_id, connection_id).await {
        warn!(connection_id, error = %err, "failed to leave room");
    }
}

/// Route one inbound message to the joined room.
async fn dispatch(
    state: &SharedState,
    room_id: &str,
    message: ClientMessage,
    outbound_tx: &mpsc::Sender<Message>,
) -> Result<(), SessionError> {
    match message {
        ClientMessage::Join { .. } => {
            warn!(room_id, "ignoring duplicate join message");
        }
        ClientMessage::Play { time } => playback_service::play(state, room_id, time).await?,
        ClientMessage::Pause => playback_service::pause(state, room_id).await?,
        ClientMessage::Seek { time } => playback_service::seek(state, room_id, time).await?,
        ClientMessage::Next => playback_service::next(state, room_id).await?,
        ClientMessage::Previous => playback_service::previous(state, room_id).await?,
        ClientMessage::Select { index } => {
            queue_service::select(state, room_id, index).await?;
        }
        ClientMessage::Remove { index } => {
            queue_service::remove(state, room_id, index).await?;
        }
        ClientMessage::Reorder {
            from_index,
            to_index,
        } => {
            queue_service::reorder(state, room_id, from_index, to_index).await?;
        }
        ClientMessage::ShuffleToggle { enabled } => {
            playback_service::set_shuffle(state, room_id, enabled).await?
        }
        ClientMessage::LoopToggle { enabled } => {
            playback_service::set_loop(state, room_id, enabled).await?
        }
        ClientMessage::LoopRestart => playback_service::loop_restart(state, room_id).await?,
        ClientMessage::Sync { time } => playback_service::catch_up(state, room_id, time).await?,
        ClientMessage::Ping => send_message(outbound_tx, &sync_service::pong(state)).await?,
        ClientMessage::Unknown => warn!(room_id, "ignoring unknown message type"),
    }
    Ok(())
}

/// Relay room broadcasts to this connection's writer.
///
/// Sends wait for room in the writer channel. A subscriber that falls behind
/// the room hub gets a fresh `room_state` instead of the dropped events.
fn spawn_forwarder(
    state: SharedState,
    room: Arc<Room>,
    mut receiver: broadcast::Receiver<ServerMessage>,
    outbound_tx: mpsc::Sender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let message = match receiver.recv().await {
                Ok(message) => message,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(room_id = room.id(), skipped, "listener lagged; resending room state");
                    let snapshot = room.with_state(|room| room.snapshot(state.now())).await;
                    ServerMessage::RoomState { room: snapshot }
                }
                Err(RecvError::Closed) => break,
            };
            if send_message(&outbound_tx, &message).await.is_err() {
                break;
            }
        }
    })
}

/// Send an error then close the socket.
async fn reject(outbound_tx: &mpsc::Sender<Message>, reason: &str) {
    let _ = send_message(outbound_tx, &ServerMessage::error(reason)).await;
    let _ = outbound_tx.send(Message::Close(None)).await;
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; only a closed writer is an error.
async fn send_message(
    tx: &mpsc::Sender<Message>,
    message: &ServerMessage,
) -> Result<(), SessionError> {
    let payload = match serde_json::to_string(message) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, kind = message.kind(), "failed to serialize message");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .await
        .map_err(|_| SessionError::ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::Sender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
