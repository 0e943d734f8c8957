use serde::Serialize;
use utoipa::ToSchema;

/// Overall service condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The match store is installed.
    Ok,
    /// No reachable match store; only stateless endpoints work.
    Degraded,
}

/// Payload of the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: HealthStatus,
    /// Whether the last probe of the match store succeeded.
    pub store_reachable: bool,
}

impl HealthResponse {
    /// Build the payload from the degraded flag and the probe result.
    pub fn new(degraded: bool, store_reachable: bool) -> Self {
        Self {
            status: if degraded {
                HealthStatus::Degraded
            } else {
                HealthStatus::Ok
            },
            store_reachable,
        }
    }
}
