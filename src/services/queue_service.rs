use crate::{
    dto::room::{EnqueueTrackRequest, QueueResponse},
    error::ServiceError,
    services::room_service::transition,
    state::SharedState,
};

/// Append a track to the room queue.
pub async fn enqueue(
    state: &SharedState,
    room_id: &str,
    request: EnqueueTrackRequest,
) -> Result<QueueResponse, ServiceError> {
    transition(state, room_id, |room, now| {
        let out = room.enqueue(request.into_track(now), now);
        Ok((out, room.queue_response()))
    })
    .await
}

/// Make the entry at `index` current, paused at its start.
pub async fn select(
    state: &SharedState,
    room_id: &str,
    index: usize,
) -> Result<QueueResponse, ServiceError> {
    transition(state, room_id, |room, now| {
        let out = room.select(index, now)?;
        Ok((out, room.queue_response()))
    })
    .await
}

/// Remove the entry at `index`.
pub async fn remove(
    state: &SharedState,
    room_id: &str,
    index: usize,
) -> Result<QueueResponse, ServiceError> {
    transition(state, room_id, |room, now| {
        let out = room.remove(index, now)?;
        Ok((out, room.queue_response()))
    })
    .await
}

/// Move the entry at `from_index` to `to_index`, keeping the current track current.
pub async fn reorder(
    state: &SharedState,
    room_id: &str,
    from_index: usize,
    to_index: usize,
) -> Result<QueueResponse, ServiceError> {
    transition(state, room_id, |room, _now| {
        let out = room.reorder(from_index, to_index)?;
        Ok((out, room.queue_response()))
    })
    .await
}
