//! Library crate for synctune-back: synchronized listening rooms over WebSocket,
//! exposed for the server binary, the OpenAPI generator and tests.

/// Environment-driven configuration.
pub mod config;
/// Wire types for HTTP, SSE and WebSocket payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// Axum routers and handlers.
pub mod routes;
/// Room operations shared by every transport.
pub mod services;
/// In-memory room state and its registry.
pub mod state;
