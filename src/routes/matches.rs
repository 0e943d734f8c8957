use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::matches::{
        CreateMatchRequest, MatchListItem, MatchSummary, ParticipantInput,
        UpdateParticipantRequest,
    },
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Match and roster management endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route("/matches/{id}", get(get_match).delete(delete_match))
        .route("/matches/{id}/participants", post(add_participant))
        .route(
            "/matches/{id}/participants/{player_id}",
            put(update_participant).delete(remove_participant),
        )
}

/// List stored matches, oldest first.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    responses((status = 200, description = "Stored matches", body = [MatchListItem]))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MatchListItem>>, AppError> {
    Ok(Json(match_service::list_matches(&state).await?))
}

/// Schedule a new match, optionally with its initial roster.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match created", body = MatchSummary),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateMatchRequest>>,
) -> Result<(StatusCode, Json<MatchSummary>), AppError> {
    let summary = match_service::create_match(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Match", body = MatchSummary),
        (status = 404, description = "Unknown match")
    )
)]
/// A match with its roster.
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::get_match(&state, id).await?))
}

#[utoipa::path(
    delete,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses(
        (status = 204, description = "Match deleted"),
        (status = 404, description = "Unknown match")
    )
)]
/// Delete a match.
pub async fn delete_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    match_service::delete_match(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Register a player for a match.
#[utoipa::path(
    post,
    path = "/matches/{id}/participants",
    tag = "matches",
    params(("id" = String, Path, description = "Identifier of the match")),
    request_body = ParticipantInput,
    responses(
        (status = 200, description = "Updated match", body = MatchSummary),
        (status = 409, description = "Player already registered")
    )
)]
pub async fn add_participant(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ParticipantInput>>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::add_participant(&state, id, payload).await?))
}

/// Edit a registered player or toggle their confirmation.
#[utoipa::path(
    put,
    path = "/matches/{id}/participants/{player_id}",
    tag = "matches",
    params(
        ("id" = String, Path, description = "Identifier of the match"),
        ("player_id" = String, Path, description = "Identifier of the player")
    ),
    request_body = UpdateParticipantRequest,
    responses((status = 200, description = "Updated match", body = MatchSummary))
)]
pub async fn update_participant(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    Valid(Json(payload)): Valid<Json<UpdateParticipantRequest>>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(
        match_service::update_participant(&state, id, player_id, payload).await?,
    ))
}

/// Unregister a player. Their team label, if any, is dropped.
#[utoipa::path(
    delete,
    path = "/matches/{id}/participants/{player_id}",
    tag = "matches",
    params(
        ("id" = String, Path, description = "Identifier of the match"),
        ("player_id" = String, Path, description = "Identifier of the player")
    ),
    responses((status = 200, description = "Updated match", body = MatchSummary))
)]
pub async fn remove_participant(
    State(state): State<SharedState>,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(
        match_service::remove_participant(&state, id, player_id).await?,
    ))
}
