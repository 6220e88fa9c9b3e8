/// Campaign control operations and store bootstrap.
pub mod campaign_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Outbound state and tick messages.
pub mod hub_events;
/// Product catalogue CRUD.
pub mod product_service;
/// Server-Sent Events subscribers.
pub mod sse_service;
/// Background writer for the campaign record.
pub mod state_persistence;
/// Storage connection supervisor with degraded mode.
pub mod storage_supervisor;
/// Slot template CRUD.
pub mod template_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
