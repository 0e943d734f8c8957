use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::teams::{BalanceRequest, DrawTeamsRequest, TeamsResponse},
    error::AppError,
    services::team_service,
    state::SharedState,
};

/// Team draw endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/matches/{id}/teams",
            get(get_teams).post(draw_teams).delete(clear_teams),
        )
        .route("/balance", post(balance))
}

/// Teams from the last draw of a match.
#[utoipa::path(
    get,
    path = "/matches/{id}/teams",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses((status = 200, description = "Stored teams", body = TeamsResponse))
)]
pub async fn get_teams(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamsResponse>, AppError> {
    Ok(Json(team_service::get_teams(&state, id).await?))
}

/// Draw teams among confirmed participants, replacing the previous draw.
#[utoipa::path(
    post,
    path = "/matches/{id}/teams",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the match")),
    request_body = DrawTeamsRequest,
    responses(
        (status = 200, description = "Teams drawn", body = TeamsResponse),
        (status = 400, description = "Team count out of range or not enough confirmed players"),
        (status = 409, description = "Match changed concurrently")
    )
)]
pub async fn draw_teams(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<DrawTeamsRequest>>,
) -> Result<Json<TeamsResponse>, AppError> {
    Ok(Json(
        team_service::draw_teams(&state, id, payload.team_count, payload.reshuffle).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/matches/{id}/teams",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the match")),
    responses((status = 204, description = "Teams cleared"))
)]
/// Forget the last draw of a match.
pub async fn clear_teams(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    team_service::clear_teams(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Balance an ad-hoc roster without storing anything.
#[utoipa::path(
    post,
    path = "/balance",
    tag = "teams",
    request_body = BalanceRequest,
    responses(
        (status = 200, description = "Balanced teams", body = TeamsResponse),
        (status = 400, description = "Invalid roster or team count")
    )
)]
pub async fn balance(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<BalanceRequest>>,
) -> Result<Json<TeamsResponse>, AppError> {
    Ok(Json(team_service::preview(
        state.config(),
        payload.players,
        payload.team_count,
        payload.reshuffle,
    )?))
}
