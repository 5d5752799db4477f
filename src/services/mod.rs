/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Room membership and presence.
pub mod membership_service;
/// Transport controls: play, pause, seek, track changes and flags.
pub mod playback_service;
/// Queue mutations exposed over HTTP and WebSocket.
pub mod queue_service;
/// Room creation, lookup and the shared mutation helper.
pub mod room_service;
/// Server-Sent Events observer streams.
pub mod sse_service;
/// Periodic clock anchors and ping replies.
pub mod sync_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
