use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of clients currently attached to the broadcast hub.
    pub clients: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(clients: usize) -> Self {
        Self {
            status: "ok".to_string(),
            clients,
        }
    }

    /// Create a health response indicating the store is unreachable.
    pub fn degraded(clients: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            clients,
        }
    }
}
