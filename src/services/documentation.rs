use utoipa::OpenApi;

/// Aggregated OpenAPI specification for Pelada Back.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::list_matches,
        crate::routes::matches::create_match,
        crate::routes::matches::get_match,
        crate::routes::matches::delete_match,
        crate::routes::matches::add_participant,
        crate::routes::matches::update_participant,
        crate::routes::matches::remove_participant,
        crate::routes::teams::get_teams,
        crate::routes::teams::draw_teams,
        crate::routes::teams::clear_teams,
        crate::routes::teams::balance,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::matches::PlayerInput,
            crate::dto::matches::ParticipantInput,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::UpdateParticipantRequest,
            crate::dto::matches::ParticipantSummary,
            crate::dto::matches::MatchSummary,
            crate::dto::matches::MatchListItem,
            crate::dto::teams::DrawTeamsRequest,
            crate::dto::teams::BalanceRequest,
            crate::dto::teams::TeamPlayer,
            crate::dto::teams::TeamSummary,
            crate::dto::teams::TeamsResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Matches and their rosters"),
        (name = "teams", description = "Team draws"),
    )
)]
/// OpenAPI document of the REST API.
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_team_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/matches/{id}/teams"));
        assert!(doc.paths.paths.contains_key("/balance"));
    }
}
