//! Match and roster management. Every edit loads the match, applies the change in
//! memory and writes the whole document back, conditioned on the revision it read.

use std::{future::Future, time::SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::{MatchEntity, ParticipantEntity},
    dto::matches::{
        CreateMatchRequest, MatchListItem, MatchSummary, ParticipantInput,
        UpdateParticipantRequest,
    },
    error::ServiceError,
    state::{SharedState, pelada::Participant},
};

/// Attempts made by a read-modify-write before giving up on a busy match.
const WRITE_ATTEMPTS: u32 = 3;

pub(crate) fn match_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("match `{id}` not found"))
}

fn participant_not_found(match_id: Uuid, player_id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!(
        "player `{player_id}` is not registered for match `{match_id}`"
    ))
}

pub(crate) async fn load_match(state: &SharedState, id: Uuid) -> Result<MatchEntity, ServiceError> {
    let store = state.require_match_store().await?;
    store.find_match(id).await?.ok_or_else(|| match_not_found(id))
}

/// Run `write` again from a fresh read each time it loses a race on `match_id`.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    match_id: Uuid,
    mut write: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Err(ServiceError::Conflict(reason)) if attempt < WRITE_ATTEMPTS => {
                debug!(%match_id, attempt, %reason, "match changed concurrently; retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Load the match, let `edit` change it and store it back unless someone else
/// wrote it meanwhile. Draws committed in between are kept by re-running `edit`.
async fn edit_match<F>(
    state: &SharedState,
    match_id: Uuid,
    edit: F,
) -> Result<MatchEntity, ServiceError>
where
    F: Fn(&mut MatchEntity) -> Result<(), ServiceError>,
{
    let edit = &edit;
    retry_on_conflict(match_id, || async move {
        let mut entity = load_match(state, match_id).await?;
        edit(&mut entity)?;
        entity.updated_at = SystemTime::now();

        let store = state.require_match_store().await?;
        if !store.update_match(entity.clone()).await? {
            return Err(match_not_found(match_id));
        }
        entity.revision += 1;
        Ok(entity)
    })
    .await
}

/// Persist a new match with its initial roster.
pub async fn create_match(
    state: &SharedState,
    request: CreateMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    let now = SystemTime::now();
    let participants: Vec<ParticipantEntity> = request
        .participants
        .into_iter()
        .map(|input| input.into_participant().into())
        .collect();

    let entity = MatchEntity {
        id: Uuid::new_v4(),
        name: request.name.trim().to_owned(),
        venue: request
            .venue
            .map(|venue| venue.trim().to_owned())
            .filter(|venue| !venue.is_empty()),
        scheduled_at: request.scheduled_at.map(SystemTime::from),
        created_at: now,
        updated_at: now,
        participants,
        team_count: 0,
        team_assignments: Vec::new(),
        revision: 0,
    };

    let store = state.require_match_store().await?;
    store.insert_match(entity.clone()).await?;
    info!(match_id = %entity.id, participants = entity.participants.len(), "match created");

    Ok(entity.into())
}

/// All stored matches, oldest first.
pub async fn list_matches(state: &SharedState) -> Result<Vec<MatchListItem>, ServiceError> {
    let store = state.require_match_store().await?;
    let mut matches = store.list_matches().await?;
    matches.sort_by_key(|item| item.created_at);
    Ok(matches.into_iter().map(MatchListItem::from).collect())
}

/// One match with its roster and current team labels.
pub async fn get_match(state: &SharedState, id: Uuid) -> Result<MatchSummary, ServiceError> {
    Ok(load_match(state, id).await?.into())
}

/// Remove a match for good.
pub async fn delete_match(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_match_store().await?;
    if !store.delete_match(id).await? {
        return Err(match_not_found(id));
    }
    info!(match_id = %id, "match deleted");
    Ok(())
}

/// Register a player for a match. A player can only be registered once.
pub async fn add_participant(
    state: &SharedState,
    match_id: Uuid,
    input: ParticipantInput,
) -> Result<MatchSummary, ServiceError> {
    let participant: ParticipantEntity = input.into_participant().into();
    debug!(%match_id, player_id = %participant.player_id, "adding participant");

    let entity = edit_match(state, match_id, |entity| {
        if entity
            .participants
            .iter()
            .any(|existing| existing.player_id == participant.player_id)
        {
            return Err(ServiceError::InvalidState(format!(
                "player `{}` is already registered for match `{match_id}`",
                participant.player_id
            )));
        }
        entity.participants.push(participant.clone());
        Ok(())
    })
    .await?;
    Ok(entity.into())
}

/// Apply a partial update to a registered player. Existing team assignments are kept.
pub async fn update_participant(
    state: &SharedState,
    match_id: Uuid,
    player_id: Uuid,
    update: UpdateParticipantRequest,
) -> Result<MatchSummary, ServiceError> {
    let entity = edit_match(state, match_id, |entity| {
        let slot = entity
            .participants
            .iter_mut()
            .find(|participant| participant.player_id == player_id)
            .ok_or_else(|| participant_not_found(match_id, player_id))?;

        let mut participant = Participant::from(slot.clone());
        update.clone().apply_to(&mut participant);
        *slot = participant.into();
        Ok(())
    })
    .await?;

    debug!(%match_id, %player_id, "participant updated");
    Ok(entity.into())
}

/// Unregister a player, dropping any team label they held.
pub async fn remove_participant(
    state: &SharedState,
    match_id: Uuid,
    player_id: Uuid,
) -> Result<MatchSummary, ServiceError> {
    let entity = edit_match(state, match_id, |entity| {
        let before = entity.participants.len();
        entity
            .participants
            .retain(|participant| participant.player_id != player_id);
        if entity.participants.len() == before {
            return Err(participant_not_found(match_id, player_id));
        }
        entity
            .team_assignments
            .retain(|assignment| assignment.player_id != player_id);
        Ok(())
    })
    .await?;

    debug!(%match_id, %player_id, "participant removed");
    Ok(entity.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            match_store::memory::MemoryMatchStore,
            models::{TeamAssignmentEntity, TeamDrawEntity},
            storage::StorageError,
        },
        services::team_service,
        state::AppState,
    };

    async fn state() -> SharedState {
        AppState::with_store(AppConfig::default(), Arc::new(MemoryMatchStore::new())).await
    }

    fn participant(name: &str, confirmed: bool) -> ParticipantInput {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "position": "Meia",
            "skill_rating": "4",
            "confirmed": confirmed
        }))
        .unwrap()
    }

    fn create_request(participants: Vec<ParticipantInput>) -> CreateMatchRequest {
        CreateMatchRequest {
            name: "  Pelada de quinta ".into(),
            venue: Some("".into()),
            scheduled_at: None,
            participants,
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let state = state().await;
        let created = create_match(&state, create_request(vec![participant("Zico", true)]))
            .await
            .unwrap();

        assert_eq!(created.name, "Pelada de quinta");
        assert_eq!(created.venue, None);
        assert!(!created.teams_drawn);

        let fetched = get_match(&state, created.id).await.unwrap();
        assert_eq!(fetched.participants.len(), 1);
        assert_eq!(fetched.participants[0].skill_rating, 4.0);
    }

    #[tokio::test]
    async fn list_is_sorted_by_creation() {
        let state = state().await;
        let first = create_match(&state, create_request(vec![])).await.unwrap();
        let second = create_match(&state, create_request(vec![])).await.unwrap();

        let ids: Vec<Uuid> = list_matches(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let state = state().await;
        let created = create_match(&state, create_request(vec![])).await.unwrap();
        let mut input = participant("Zico", true);
        input.player.id = Some(Uuid::new_v4());

        add_participant(&state, created.id, input.clone())
            .await
            .unwrap();
        let err = add_participant(&state, created.id, input).await.unwrap_err();

        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn update_confirms_a_participant() {
        let state = state().await;
        let created = create_match(&state, create_request(vec![participant("Zico", false)]))
            .await
            .unwrap();
        let player_id = created.participants[0].player_id;

        let update = UpdateParticipantRequest {
            confirmed: Some(true),
            ..Default::default()
        };
        let updated = update_participant(&state, created.id, player_id, update)
            .await
            .unwrap();

        assert!(updated.participants[0].confirmed);
    }

    #[tokio::test]
    async fn removing_a_participant_drops_their_assignment() {
        let state = state().await;
        let created = create_match(
            &state,
            create_request(vec![participant("Zico", true), participant("Sócrates", true)]),
        )
        .await
        .unwrap();
        let removed = created.participants[0].player_id;
        let kept = created.participants[1].player_id;

        let store = state.require_match_store().await.unwrap();
        let draw = TeamDrawEntity {
            team_count: 2,
            assignments: vec![
                TeamAssignmentEntity {
                    player_id: removed,
                    team: "A".into(),
                },
                TeamAssignmentEntity {
                    player_id: kept,
                    team: "B".into(),
                },
            ],
        };
        store.save_team_draw(created.id, 0, draw).await.unwrap();

        let summary = remove_participant(&state, created.id, removed).await.unwrap();
        assert_eq!(summary.participants.len(), 1);
        assert_eq!(summary.participants[0].team.as_deref(), Some("B"));

        let entity = store.find_match(created.id).await.unwrap().unwrap();
        assert_eq!(entity.team_assignments.len(), 1);
        assert_eq!(entity.team_count, 2);
    }

    #[tokio::test]
    async fn roster_edit_keeps_a_draw_committed_after_its_read() {
        let state = state().await;
        let created = create_match(
            &state,
            create_request(vec![
                participant("Zico", true),
                participant("Sócrates", true),
                participant("Falcão", true),
            ]),
        )
        .await
        .unwrap();
        let store = state.require_match_store().await.unwrap();
        let mut stale = store.find_match(created.id).await.unwrap().unwrap();

        team_service::draw_teams(&state, created.id, 2, Some(false))
            .await
            .unwrap();

        // A write based on the pre-draw read must not erase the draw.
        stale.participants[0].confirmed = false;
        let err = store.update_match(stale).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));
        let stored = store.find_match(created.id).await.unwrap().unwrap();
        assert_eq!(stored.team_assignments.len(), 3);

        // The service path re-reads, so the same edit goes through and keeps the draw.
        let update = UpdateParticipantRequest {
            confirmed: Some(false),
            ..Default::default()
        };
        let player_id = created.participants[0].player_id;
        let summary = update_participant(&state, created.id, player_id, update)
            .await
            .unwrap();

        assert!(!summary.participants[0].confirmed);
        assert!(summary.teams_drawn);
        let stored = store.find_match(created.id).await.unwrap().unwrap();
        assert_eq!(stored.team_assignments.len(), 3);
        assert_eq!(stored.team_count, 2);
    }

    #[tokio::test]
    async fn retries_stop_after_the_last_attempt() {
        let mut calls = 0;
        let result: Result<(), ServiceError> = retry_on_conflict(Uuid::nil(), || {
            calls += 1;
            async { Err(ServiceError::Conflict("busy".into())) }
        })
        .await;

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        assert_eq!(calls, WRITE_ATTEMPTS);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let state = state().await;
        let missing = Uuid::new_v4();

        assert!(matches!(
            get_match(&state, missing).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete_match(&state, missing).await,
            Err(ServiceError::NotFound(_))
        ));

        let created = create_match(&state, create_request(vec![])).await.unwrap();
        assert!(matches!(
            remove_participant(&state, created.id, missing).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn degraded_mode_rejects_operations() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            list_matches(&state).await,
            Err(ServiceError::Degraded)
        ));
    }
}
