use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for SyncTune Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::get_queue,
        crate::routes::rooms::enqueue_track,
        crate::routes::rooms::select_track,
        crate::routes::rooms::remove_track,
        crate::routes::rooms::reorder_queue,
        crate::routes::sse::room_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::RoomSnapshot,
            crate::dto::room::QueueResponse,
            crate::dto::room::TrackSummary,
            crate::dto::room::MemberSummary,
            crate::dto::room::MediaReference,
            crate::dto::room::EnqueueTrackRequest,
            crate::dto::room::ReorderRequest,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::error::ErrorBody,
            crate::state::room::DeviceClass,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room creation, state and queue management"),
        (name = "sse", description = "Read-only room event streams"),
        (name = "listeners", description = "WebSocket protocol for listening clients"),
    )
)]
pub struct ApiDoc;
