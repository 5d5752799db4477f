//! Room lookup and the lock-then-fan-out helper every room mutation goes through.

use std::sync::Arc;

use crate::{
    dto::room::{CreateRoomResponse, QueueResponse, RoomSnapshot},
    error::ServiceError,
    state::{
        SharedState,
        registry::Room,
        room::{RoomError, RoomState},
        transport::Broadcast,
    },
};

/// Register a new, empty room and return its identifier.
pub fn create_room(state: &SharedState) -> CreateRoomResponse {
    let room = state.rooms().create(state.now());
    CreateRoomResponse {
        room_id: room.id().to_string(),
    }
}

/// Position-corrected view of a room as of now.
pub async fn room_snapshot(state: &SharedState, room_id: &str) -> Result<RoomSnapshot, ServiceError> {
    let room = require_room(state, room_id)?;
    Ok(room.with_state(|room| room.snapshot(state.now())).await)
}

/// Current queue and pointer of a room.
pub async fn queue(state: &SharedState, room_id: &str) -> Result<QueueResponse, ServiceError> {
    let room = require_room(state, room_id)?;
    Ok(room.with_state(|room| room.queue_response()).await)
}

pub(crate) fn require_room(state: &SharedState, room_id: &str) -> Result<Arc<Room>, ServiceError> {
    state
        .rooms()
        .get(room_id)
        .ok_or_else(|| ServiceError::RoomNotFound(room_id.to_string()))
}

/// Run a transition under the room lock and fan its messages out to the room.
///
/// `now` is read after the lock is taken so successive anchors never go backwards.
/// Messages are handed to the hub before the lock is released, so every member
/// observes broadcasts in the order the transitions were applied. Hub sends never block.
pub(crate) async fn transition<F, T>(
    state: &SharedState,
    room_id: &str,
    f: F,
) -> Result<T, ServiceError>
where
    F: FnOnce(&mut RoomState, f64) -> Result<(Broadcast, T), RoomError>,
{
    let room = require_room(state, room_id)?;
    let hub = room.hub();
    let value = room
        .with_state(|room| {
            let (messages, value) = f(room, state.now())?;
            hub.broadcast_all(messages);
            Ok::<_, RoomError>(value)
        })
        .await?;
    Ok(value)
}

/// [`transition`] for the infallible transitions that only produce messages.
pub(crate) async fn apply<F>(state: &SharedState, room_id: &str, f: F) -> Result<(), ServiceError>
where
    F: FnOnce(&mut RoomState, f64) -> Broadcast,
{
    transition(state, room_id, |room, now| Ok((f(room, now), ()))).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, clock::ManualClock},
    };

    #[tokio::test]
    async fn created_rooms_can_be_read_back() {
        let state = AppState::with_clock(AppConfig::default(), Arc::new(ManualClock::new(50.0)));
        let created = create_room(&state);

        let snapshot = room_snapshot(&state, &created.room_id).await.unwrap();
        assert_eq!(snapshot.room_id, created.room_id);
        assert_eq!(snapshot.server_time, 50.0);
        assert!(!snapshot.is_playing);

        let queue = queue(&state, &created.room_id).await.unwrap();
        assert!(queue.queue.is_empty());
        assert_eq!(queue.current_index, -1);
    }

    #[tokio::test]
    async fn unknown_rooms_are_reported() {
        let state = AppState::new(AppConfig::default());
        let err = room_snapshot(&state, "zzzzzz").await.unwrap_err();
        assert_eq!(err, ServiceError::RoomNotFound("zzzzzz".into()));
    }
}
