//! Validation helpers for DTOs.

use std::collections::HashSet;

use validator::ValidationError;

use uuid::Uuid;

use crate::dto::matches::{ParticipantInput, PlayerInput};

/// Rejects strings made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Rejects rosters listing the same explicit player id twice.
///
/// Players without an id get a fresh one and never collide.
pub fn validate_unique_player_ids(players: &[PlayerInput]) -> Result<(), ValidationError> {
    ensure_unique_ids(players.iter().filter_map(|player| player.id))
}

/// Same as [`validate_unique_player_ids`] for a match roster.
pub fn validate_unique_participant_ids(
    participants: &[ParticipantInput],
) -> Result<(), ValidationError> {
    ensure_unique_ids(participants.iter().filter_map(|participant| participant.player.id))
}

fn ensure_unique_ids(ids: impl IntoIterator<Item = Uuid>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            let mut err = ValidationError::new("duplicate_player");
            err.message = Some(format!("player `{id}` is listed more than once").into());
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: Option<Uuid>) -> PlayerInput {
        PlayerInput {
            id,
            name: "Zico".into(),
            avatar_url: None,
            position: String::new(),
            skill_rating: None,
        }
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Pelada").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_validate_unique_player_ids() {
        let id = Uuid::new_v4();
        assert!(validate_unique_player_ids(&[input(Some(id)), input(None), input(None)]).is_ok());
        assert!(validate_unique_player_ids(&[input(Some(id)), input(Some(id))]).is_err());
        assert!(validate_unique_player_ids(&[]).is_ok());
    }
}
