use axum::Router;

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// Health check.
pub mod health;
/// Match and roster endpoints.
pub mod matches;
/// Team draw endpoints.
pub mod teams;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(matches::router())
        .merge(teams::router())
        .merge(docs::router())
        .with_state(state)
}
