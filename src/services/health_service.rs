use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the match store and report whether the service runs degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let reachable = match state.require_match_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "match store health check failed");
                false
            }
        },
        Err(_) => {
            warn!("no match store installed (degraded mode)");
            false
        }
    };

    HealthResponse::new(state.is_degraded(), reachable)
}
