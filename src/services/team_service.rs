//! Team draws: validate the request, draft the confirmed roster and persist every
//! label in a single write.

use std::{collections::BTreeMap, num::NonZeroUsize};

use rand::rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::models::{TeamAssignmentEntity, TeamDrawEntity},
    dto::{
        matches::PlayerInput,
        teams::{TeamPlayer, TeamSummary, TeamsResponse},
    },
    error::ServiceError,
    services::{
        match_service::{load_match, match_not_found, retry_on_conflict},
        team_balancer::{balance_teams, label_assignments, shuffle_roster, team_label},
    },
    state::{
        SharedState,
        pelada::{Participant, Player},
    },
};

/// Check `team_count` against the configured window and the roster size requirement.
fn validate_draw(
    config: &AppConfig,
    team_count: usize,
    roster_len: usize,
) -> Result<NonZeroUsize, ServiceError> {
    let range = config.team_count_range();
    if !range.contains(&team_count) {
        return Err(ServiceError::InvalidInput(format!(
            "team count must be between {} and {}, got {team_count}",
            range.start(),
            range.end()
        )));
    }
    if roster_len < config.min_players {
        return Err(ServiceError::InvalidInput(format!(
            "at least {} confirmed players are required, got {roster_len}",
            config.min_players
        )));
    }
    NonZeroUsize::new(team_count)
        .ok_or_else(|| ServiceError::InvalidInput("team count must be positive".into()))
}

/// Shuffle when asked to, then run the snake draft.
fn draft(
    config: &AppConfig,
    mut roster: Vec<Player>,
    team_count: NonZeroUsize,
    reshuffle: Option<bool>,
) -> Vec<Vec<Player>> {
    if reshuffle.unwrap_or(config.reshuffle_by_default) {
        shuffle_roster(&mut roster, &mut rng());
    }
    balance_teams(&roster, team_count)
}

/// Draw teams among the confirmed participants of a match, replacing any earlier draw.
///
/// The draw is stored only if the roster it was computed from is still current;
/// otherwise it is recomputed from a fresh read.
pub async fn draw_teams(
    state: &SharedState,
    match_id: Uuid,
    team_count: usize,
    reshuffle: Option<bool>,
) -> Result<TeamsResponse, ServiceError> {
    retry_on_conflict(match_id, || async move {
        let entity = load_match(state, match_id).await?;
        let roster: Vec<Player> = entity
            .participants
            .into_iter()
            .map(Participant::from)
            .filter(|participant| participant.confirmed)
            .map(|participant| participant.player)
            .collect();

        let config = state.config();
        let count = validate_draw(config, team_count, roster.len())?;
        let teams = draft(config, roster, count, reshuffle);

        let draw = TeamDrawEntity {
            team_count: count.get(),
            assignments: label_assignments(&teams)
                .into_iter()
                .map(TeamAssignmentEntity::from)
                .collect(),
        };
        debug!(%match_id, assignments = draw.assignments.len(), "persisting team draw");

        let store = state.require_match_store().await?;
        if !store.save_team_draw(match_id, entity.revision, draw).await? {
            return Err(match_not_found(match_id));
        }

        info!(%match_id, team_count, "teams drawn");
        Ok(TeamsResponse::from_teams(Some(match_id), &teams))
    })
    .await
}

/// Teams from the last stored draw, plus confirmed players who hold no team.
///
/// Every drawn team is listed, including the ones the draft left empty.
pub async fn get_teams(state: &SharedState, match_id: Uuid) -> Result<TeamsResponse, ServiceError> {
    let entity = load_match(state, match_id).await?;
    let participants: Vec<Participant> = entity
        .participants
        .into_iter()
        .map(Participant::from)
        .collect();

    // Keyed by (length, label) so `Z` sorts before `AA`.
    let mut teams: BTreeMap<(usize, String), Vec<Player>> = (0..entity.team_count)
        .map(team_label)
        .map(|label| ((label.len(), label), Vec::new()))
        .collect();
    for assignment in &entity.team_assignments {
        let Some(participant) = participants
            .iter()
            .find(|participant| participant.player.id == assignment.player_id)
        else {
            continue;
        };
        teams
            .entry((assignment.team.len(), assignment.team.clone()))
            .or_default()
            .push(participant.player.clone());
    }

    let unassigned = if teams.is_empty() {
        Vec::new()
    } else {
        participants
            .iter()
            .filter(|participant| participant.confirmed)
            .filter(|participant| {
                !entity
                    .team_assignments
                    .iter()
                    .any(|assignment| assignment.player_id == participant.player.id)
            })
            .map(|participant| TeamPlayer::from(&participant.player))
            .collect()
    };

    Ok(TeamsResponse {
        match_id: Some(match_id),
        teams: teams
            .into_iter()
            .map(|((_, label), players)| TeamSummary::new(label, &players))
            .collect(),
        unassigned,
    })
}

/// Forget the last draw of a match.
pub async fn clear_teams(state: &SharedState, match_id: Uuid) -> Result<(), ServiceError> {
    retry_on_conflict(match_id, || async move {
        let entity = load_match(state, match_id).await?;
        let store = state.require_match_store().await?;
        if !store
            .save_team_draw(match_id, entity.revision, TeamDrawEntity::default())
            .await?
        {
            return Err(match_not_found(match_id));
        }
        Ok(())
    })
    .await?;
    info!(%match_id, "teams cleared");
    Ok(())
}

/// Balance an ad-hoc roster without touching storage.
pub fn preview(
    config: &AppConfig,
    players: Vec<PlayerInput>,
    team_count: usize,
    reshuffle: Option<bool>,
) -> Result<TeamsResponse, ServiceError> {
    let roster: Vec<Player> = players.into_iter().map(PlayerInput::into_player).collect();
    let count = validate_draw(config, team_count, roster.len())?;
    let teams = draft(config, roster, count, reshuffle);
    Ok(TeamsResponse::from_teams(None, &teams))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dao::match_store::memory::MemoryMatchStore,
        dto::matches::{CreateMatchRequest, ParticipantInput, UpdateParticipantRequest},
        services::match_service,
        state::AppState,
    };

    async fn state() -> SharedState {
        AppState::with_store(AppConfig::default(), Arc::new(MemoryMatchStore::new())).await
    }

    fn participant(name: &str, position: &str, skill: f64, confirmed: bool) -> ParticipantInput {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "position": position,
            "skill_rating": skill,
            "confirmed": confirmed
        }))
        .unwrap()
    }

    async fn match_with(state: &SharedState, participants: Vec<ParticipantInput>) -> Uuid {
        match_service::create_match(
            state,
            CreateMatchRequest {
                name: "Pelada".into(),
                venue: None,
                scheduled_at: None,
                participants,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn labels_and_names(response: &TeamsResponse) -> Vec<(String, Vec<String>)> {
        response
            .teams
            .iter()
            .map(|team| {
                (
                    team.label.clone(),
                    team.players.iter().map(|p| p.name.clone()).collect(),
                )
            })
            .collect()
    }

    fn team(label: &str, names: &[&str]) -> (String, Vec<String>) {
        (
            label.to_owned(),
            names.iter().map(|name| name.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn draw_only_uses_confirmed_players() {
        let state = state().await;
        let match_id = match_with(
            &state,
            vec![
                participant("Taffarel", "Goleiro", 4.0, true),
                participant("Dida", "goleiro", 3.0, true),
                participant("Romário", "Atacante", 5.0, true),
                participant("Bebeto", "Atacante", 4.0, true),
                participant("Dunga", "Volante", 3.0, true),
                participant("Ausente", "Meia", 5.0, false),
            ],
        )
        .await;

        let response = draw_teams(&state, match_id, 2, Some(false)).await.unwrap();

        assert_eq!(
            labels_and_names(&response),
            vec![
                team("A", &["Taffarel", "Romário"]),
                team("B", &["Dida", "Bebeto", "Dunga"]),
            ]
        );
        assert_eq!(response.teams[0].goalkeepers, 1);
        assert_eq!(response.teams[1].total_skill, 10.0);
    }

    #[tokio::test]
    async fn stored_draw_can_be_read_back() {
        let state = state().await;
        let match_id = match_with(
            &state,
            (0..6u8)
                .map(|i| participant(&format!("p{i}"), "Meia", f64::from(i), true))
                .collect(),
        )
        .await;

        let drawn = draw_teams(&state, match_id, 3, None).await.unwrap();
        let stored = get_teams(&state, match_id).await.unwrap();

        assert_eq!(labels_and_names(&drawn), labels_and_names(&stored));
        assert!(stored.unassigned.is_empty());

        let summary = match_service::get_match(&state, match_id).await.unwrap();
        assert!(summary.teams_drawn);
        assert!(summary.participants.iter().all(|p| p.team.is_some()));
    }

    #[tokio::test]
    async fn empty_teams_survive_the_round_trip() {
        let state = state().await;
        let match_id = match_with(
            &state,
            vec![
                participant("Zico", "Meia", 5.0, true),
                participant("Júnior", "Lateral", 4.0, true),
            ],
        )
        .await;

        let drawn = draw_teams(&state, match_id, 4, None).await.unwrap();
        let stored = get_teams(&state, match_id).await.unwrap();

        assert_eq!(drawn.teams.len(), 4);
        assert_eq!(labels_and_names(&stored), labels_and_names(&drawn));
        assert_eq!(
            labels_and_names(&stored),
            vec![
                team("A", &["Zico"]),
                team("B", &["Júnior"]),
                team("C", &[]),
                team("D", &[]),
            ]
        );
        assert_eq!(stored.teams[3].average_skill, None);
    }

    #[tokio::test]
    async fn late_confirmations_are_reported_as_unassigned() {
        let state = state().await;
        let match_id = match_with(
            &state,
            vec![
                participant("a", "", 3.0, true),
                participant("b", "", 3.0, true),
                participant("c", "", 3.0, false),
            ],
        )
        .await;
        draw_teams(&state, match_id, 2, None).await.unwrap();

        let late = match_service::get_match(&state, match_id)
            .await
            .unwrap()
            .participants[2]
            .player_id;
        match_service::update_participant(
            &state,
            match_id,
            late,
            UpdateParticipantRequest {
                confirmed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let teams = get_teams(&state, match_id).await.unwrap();
        assert_eq!(teams.teams.len(), 2);
        assert_eq!(teams.unassigned.len(), 1);
        assert_eq!(teams.unassigned[0].player_id, late);
    }

    #[tokio::test]
    async fn redraw_replaces_and_clear_removes_assignments() {
        let state = state().await;
        let match_id = match_with(
            &state,
            (0..8)
                .map(|i| participant(&format!("p{i}"), "", 3.0, true))
                .collect(),
        )
        .await;

        draw_teams(&state, match_id, 4, None).await.unwrap();
        draw_teams(&state, match_id, 2, Some(true)).await.unwrap();
        let teams = get_teams(&state, match_id).await.unwrap();
        assert_eq!(teams.teams.len(), 2);
        assert_eq!(
            teams.teams.iter().map(|t| t.players.len()).sum::<usize>(),
            8
        );

        clear_teams(&state, match_id).await.unwrap();
        let teams = get_teams(&state, match_id).await.unwrap();
        assert!(teams.teams.is_empty());
        assert!(teams.unassigned.is_empty());
    }

    #[tokio::test]
    async fn draw_rejects_bad_requests() {
        let state = state().await;
        let match_id = match_with(
            &state,
            vec![
                participant("a", "", 3.0, true),
                participant("b", "", 3.0, false),
            ],
        )
        .await;

        assert!(matches!(
            draw_teams(&state, match_id, 5, None).await,
            Err(ServiceError::InvalidInput(_))
        ));
        // Only one confirmed player.
        assert!(matches!(
            draw_teams(&state, match_id, 2, None).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            draw_teams(&state, Uuid::new_v4(), 2, None).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            clear_teams(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn preview_balances_without_storage() {
        let players: Vec<PlayerInput> = serde_json::from_value(serde_json::json!([
            {"name": "a", "skill_rating": "5"},
            {"name": "b", "skill_rating": 4},
            {"name": "c", "skill_rating": "3"},
            {"name": "d", "skill_rating": "2"},
            {"name": "e"}
        ]))
        .unwrap();

        let response = preview(&AppConfig::default(), players, 2, Some(false)).unwrap();

        assert_eq!(response.match_id, None);
        assert_eq!(
            labels_and_names(&response),
            vec![team("A", &["a", "e", "d"]), team("B", &["b", "c"])]
        );
    }

    #[test]
    fn validation_honours_configured_window() {
        let config = AppConfig {
            min_team_count: 3,
            max_team_count: 5,
            min_players: 6,
            reshuffle_by_default: false,
        };

        assert!(validate_draw(&config, 2, 10).is_err());
        assert!(validate_draw(&config, 6, 10).is_err());
        assert!(validate_draw(&config, 3, 5).is_err());
        assert_eq!(validate_draw(&config, 5, 6).unwrap().get(), 5);
    }
}
