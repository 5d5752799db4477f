use tokio::sync::broadcast;

use crate::dto::ws::ServerMessage;

/// Per-room fan-out of outbound messages to member sockets and observers.
#[derive(Debug)]
pub struct RoomHub {
    sender: broadcast::Sender<ServerMessage>,
}

impl RoomHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.sender.subscribe()
    }

    /// Send a message to all current subscribers, ignoring the no-subscriber case.
    pub fn broadcast(&self, message: ServerMessage) {
        let _ = self.sender.send(message);
    }

    /// Send messages in order.
    pub fn broadcast_all(&self, messages: impl IntoIterator<Item = ServerMessage>) {
        messages.into_iter().for_each(|message| self.broadcast(message));
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
