use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report store connectivity, pinging the store when one is installed.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let clients = state.hub().len();
    if state.is_degraded() {
        HealthResponse::degraded(clients)
    } else {
        HealthResponse::ok(clients)
    }
}
