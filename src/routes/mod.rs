use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// Health check.
pub mod health;
/// Product catalogue CRUD.
pub mod products;
/// Server-Sent Events stream.
pub mod sse;
/// Campaign record and phase control.
pub mod state;
/// Slot template CRUD.
pub mod templates;
/// WebSocket channel.
pub mod websocket;

/// Compose all route trees and attach the shared state.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(websocket::router())
        .merge(state::router())
        .merge(products::router())
        .merge(templates::router())
        .merge(docs::router());

    api_router.with_state(state)
}
