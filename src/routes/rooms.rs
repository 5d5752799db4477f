use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_valid::Valid;

use crate::{
    dto::room::{
        CreateRoomResponse, EnqueueTrackRequest, QueueResponse, ReorderRequest, RoomSnapshot,
    },
    error::{AppError, ErrorBody},
    services::{queue_service, room_service},
    state::SharedState,
};

/// Room creation, inspection and queue management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/queue", get(get_queue).post(enqueue_track))
        .route("/rooms/{room_id}/queue/reorder", post(reorder_queue))
        .route("/rooms/{room_id}/queue/{index}/play", post(select_track))
        .route("/rooms/{room_id}/queue/{index}", delete(remove_track))
}

#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    responses((status = 201, description = "Room created", body = CreateRoomResponse))
)]
/// Create an empty room and return its identifier.
pub async fn create_room(
    State(state): State<SharedState>,
) -> (StatusCode, Json<CreateRoomResponse>) {
    (StatusCode::CREATED, Json(room_service::create_room(&state)))
}

#[utoipa::path(
    get,
    path = "/rooms/{room_id}",
    tag = "rooms",
    params(("room_id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Position-corrected room state", body = RoomSnapshot),
        (status = 404, description = "Unknown room", body = ErrorBody)
    )
)]
/// Read the position-corrected state of a room.
pub async fn get_room(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshot>, AppError> {
    Ok(Json(room_service::room_snapshot(&state, &room_id).await?))
}

#[utoipa::path(
    get,
    path = "/rooms/{room_id}/queue",
    tag = "rooms",
    params(("room_id" = String, Path, description = "Identifier of the room")),
    responses(
        (status = 200, description = "Queue and current pointer", body = QueueResponse),
        (status = 404, description = "Unknown room", body = ErrorBody)
    )
)]
/// Read the queue and the current pointer.
pub async fn get_queue(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Result<Json<QueueResponse>, AppError> {
    Ok(Json(room_service::queue(&state, &room_id).await?))
}

#[utoipa::path(
    post,
    path = "/rooms/{room_id}/queue",
    tag = "rooms",
    params(("room_id" = String, Path, description = "Identifier of the room")),
    request_body = EnqueueTrackRequest,
    responses(
        (status = 200, description = "Track appended", body = QueueResponse),
        (status = 400, description = "Invalid track", body = ErrorBody),
        (status = 404, description = "Unknown room", body = ErrorBody)
    )
)]
/// Append a track to the room queue and broadcast the change.
pub async fn enqueue_track(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Valid(Json(payload)): Valid<Json<EnqueueTrackRequest>>,
) -> Result<Json<QueueResponse>, AppError> {
    Ok(Json(
        queue_service::enqueue(&state, &room_id, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/rooms/{room_id}/queue/{index}/play",
    tag = "rooms",
    params(
        ("room_id" = String, Path, description = "Identifier of the room"),
        ("index" = usize, Path, description = "Queue position to make current")
    ),
    responses(
        (status = 200, description = "Track selected, paused at its start", body = QueueResponse),
        (status = 400, description = "Index out of range", body = ErrorBody),
        (status = 404, description = "Unknown room", body = ErrorBody)
    )
)]
/// Make a queue entry current, paused at its start.
pub async fn select_track(
    State(state): State<SharedState>,
    Path((room_id, index)): Path<(String, usize)>,
) -> Result<Json<QueueResponse>, AppError> {
    Ok(Json(queue_service::select(&state, &room_id, index).await?))
}

#[utoipa::path(
    delete,
    path = "/rooms/{room_id}/queue/{index}",
    tag = "rooms",
    params(
        ("room_id" = String, Path, description = "Identifier of the room"),
        ("index" = usize, Path, description = "Queue position to remove")
    ),
    responses(
        (status = 200, description = "Track removed", body = QueueResponse),
        (status = 400, description = "Index out of range", body = ErrorBody),
        (status = 404, description = "Unknown room", body = ErrorBody)
    )
)]
/// Delete a queue entry and broadcast the change.
pub async fn remove_track(
    State(state): State<SharedState>,
    Path((room_id, index)): Path<(String, usize)>,
) -> Result<Json<QueueResponse>, AppError> {
    Ok(Json(queue_service::remove(&state, &room_id, index).await?))
}

#[utoipa::path(
    post,
    path = "/rooms/{room_id}/queue/reorder",
    tag = "rooms",
    params(("room_id" = String, Path, description = "Identifier of the room")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Queue reordered", body = QueueResponse),
        (status = 400, description = "Index out of range", body = ErrorBody),
        (status = 404, description = "Unknown room", body = ErrorBody)
    )
)]
/// Move one queue entry; the current track stays current.
pub async fn reorder_queue(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Json(payload): Json<ReorderRequest>,
) -> Result<Json<QueueResponse>, AppError> {
    Ok(Json(
        queue_service::reorder(&state, &room_id, payload.from_index, payload.to_index).await?,
    ))
}
