//! Library crate for led-campaign-back, exposing modules for binaries and tests.

pub mod config;
/// Persistence backends and stored models.
pub mod dao;
mod dto;
mod error;
/// HTTP, WebSocket and SSE routers.
pub mod routes;
/// Operations shared by the routes and background tasks.
pub mod services;
pub mod state;
