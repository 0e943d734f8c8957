//! DTO definitions for matches and their rosters.

use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, serde_as};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MatchEntity, MatchListItemEntity},
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_unique_participant_ids},
    },
    state::pelada::{Participant, Player, Position, SkillRating},
};

/// Skill rating as sent by clients: a JSON number or free text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawSkillRating {
    /// Numeric rating, taken as is.
    Number(f64),
    /// Textual rating, parsed leniently.
    Text(String),
}

impl RawSkillRating {
    /// Resolve to a numeric rating; unparsable text becomes the default rating.
    pub fn into_skill(self) -> SkillRating {
        match self {
            RawSkillRating::Number(value) => SkillRating::new(value),
            RawSkillRating::Text(text) => SkillRating::parse(Some(&text)),
        }
    }
}

fn resolve_skill(raw: Option<RawSkillRating>) -> SkillRating {
    raw.map(RawSkillRating::into_skill).unwrap_or_default()
}

/// Player details supplied by clients.
///
/// Roster-level validators attach the roster to their error, hence `Serialize`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct PlayerInput {
    /// Existing player identity. A new one is generated when omitted.
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Display name; must not be blank.
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    /// An empty string is treated as "no avatar".
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub avatar_url: Option<String>,
    /// Free-text position; anything containing "goleiro" is a goalkeeper.
    #[serde(default)]
    pub position: String,
    /// Number or text; missing or unparsable values count as 3.0.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "4.5")]
    pub skill_rating: Option<RawSkillRating>,
}

impl PlayerInput {
    /// Normalize into a [`Player`], generating an id when none was given.
    pub fn into_player(self) -> Player {
        Player {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            name: self.name.trim().to_owned(),
            avatar_url: self.avatar_url,
            position: Position::new(self.position.trim()),
            skill: resolve_skill(self.skill_rating),
        }
    }
}

/// Player registered for a match.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ParticipantInput {
    /// Player details.
    #[serde(flatten)]
    #[validate(nested)]
    pub player: PlayerInput,
    /// Whether the player already confirmed attendance.
    #[serde(default)]
    pub confirmed: bool,
}

impl ParticipantInput {
    /// Normalize into a [`Participant`].
    pub fn into_participant(self) -> Participant {
        Participant {
            player: self.player.into_player(),
            confirmed: self.confirmed,
        }
    }
}

/// Payload used to schedule a new match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMatchRequest {
    /// Display name; must not be blank.
    #[validate(custom(function = "validate_not_blank"), length(max = 120))]
    pub name: String,
    /// Where the match is played; blank means unknown.
    #[serde(default)]
    pub venue: Option<String>,
    /// RFC 3339 kick-off time.
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub scheduled_at: Option<OffsetDateTime>,
    /// Initial roster.
    #[serde(default)]
    #[validate(nested, custom(function = "validate_unique_participant_ids"))]
    pub participants: Vec<ParticipantInput>,
}

/// Partial update of a participant; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateParticipantRequest {
    /// New display name.
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    /// `null` removes the avatar.
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub avatar_url: Option<Option<String>>,
    /// New free-text position.
    #[serde(default)]
    pub position: Option<String>,
    /// New rating; unparsable text counts as 3.0.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "3.5")]
    pub skill_rating: Option<RawSkillRating>,
    /// New attendance status.
    #[serde(default)]
    pub confirmed: Option<bool>,
}

impl UpdateParticipantRequest {
    /// Apply the provided fields onto `participant`.
    pub fn apply_to(self, participant: &mut Participant) {
        if let Some(name) = self.name {
            participant.player.name = name.trim().to_owned();
        }
        if let Some(avatar_url) = self.avatar_url {
            participant.player.avatar_url = avatar_url.filter(|url| !url.is_empty());
        }
        if let Some(position) = self.position {
            participant.player.position = Position::new(position.trim());
        }
        if let Some(raw) = self.skill_rating {
            participant.player.skill = raw.into_skill();
        }
        if let Some(confirmed) = self.confirmed {
            participant.confirmed = confirmed;
        }
    }
}

/// Public projection of a registered player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    /// Player identity.
    pub player_id: Uuid,
    /// Display name.
    pub name: String,
    /// Avatar reference, if any.
    pub avatar_url: Option<String>,
    /// Free-text position.
    pub position: String,
    /// Parsed skill rating.
    pub skill_rating: f64,
    /// Whether the position marks a goalkeeper.
    pub goalkeeper: bool,
    /// Whether the player confirmed attendance.
    pub confirmed: bool,
    /// Team label from the last draw, if the player was drafted.
    pub team: Option<String>,
}

/// Full match returned by create/get operations.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    /// Match identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Where the match is played.
    pub venue: Option<String>,
    /// RFC 3339 kick-off time.
    pub scheduled_at: Option<String>,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 time of the last write.
    pub updated_at: String,
    /// Roster in registration order.
    pub participants: Vec<ParticipantSummary>,
    /// Teams formed by the last draw, `0` before any draw.
    pub team_count: usize,
    /// Whether a draw is stored.
    pub teams_drawn: bool,
}

impl From<MatchEntity> for MatchSummary {
    fn from(entity: MatchEntity) -> Self {
        let assignments = entity.team_assignments;
        let participants = entity
            .participants
            .into_iter()
            .map(|participant| {
                let team = assignments
                    .iter()
                    .find(|assignment| assignment.player_id == participant.player_id)
                    .map(|assignment| assignment.team.clone());
                let participant: Participant = participant.into();
                ParticipantSummary {
                    player_id: participant.player.id,
                    goalkeeper: participant.player.is_goalkeeper(),
                    name: participant.player.name,
                    avatar_url: participant.player.avatar_url,
                    position: participant.player.position.as_str().to_owned(),
                    skill_rating: participant.player.skill.value(),
                    confirmed: participant.confirmed,
                    team,
                }
            })
            .collect();

        Self {
            id: entity.id,
            name: entity.name,
            venue: entity.venue,
            scheduled_at: entity.scheduled_at.map(format_system_time),
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
            participants,
            team_count: entity.team_count,
            teams_drawn: entity.team_count > 0,
        }
    }
}

/// Minimal projection of a match when listed.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchListItem {
    /// Match identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// RFC 3339 kick-off time.
    pub scheduled_at: Option<String>,
    /// Registered players.
    pub participant_count: usize,
    /// Players who confirmed.
    pub confirmed_count: usize,
    /// Whether a draw is stored.
    pub teams_drawn: bool,
}

impl From<MatchListItemEntity> for MatchListItem {
    fn from(entity: MatchListItemEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            scheduled_at: entity.scheduled_at.map(format_system_time),
            participant_count: entity.participant_count,
            confirmed_count: entity.confirmed_count,
            teams_drawn: entity.teams_drawn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_rating_accepts_numbers_and_text() {
        let input: PlayerInput =
            serde_json::from_value(serde_json::json!({"name": "Sócrates", "skill_rating": 4}))
                .unwrap();
        assert_eq!(input.into_player().skill.value(), 4.0);

        let input: PlayerInput =
            serde_json::from_value(serde_json::json!({"name": "Sócrates", "skill_rating": "4.5"}))
                .unwrap();
        assert_eq!(input.into_player().skill.value(), 4.5);

        let input: PlayerInput = serde_json::from_value(
            serde_json::json!({"name": "Sócrates", "skill_rating": "muito bom"}),
        )
        .unwrap();
        assert_eq!(input.into_player().skill.value(), 3.0);
    }

    #[test]
    fn participant_input_flattens_player_fields() {
        let input: ParticipantInput = serde_json::from_value(serde_json::json!({
            "name": "Taffarel",
            "position": "Goleiro",
            "avatar_url": "",
            "confirmed": true
        }))
        .unwrap();

        let participant = input.into_participant();
        assert!(participant.confirmed);
        assert!(participant.player.is_goalkeeper());
        assert_eq!(participant.player.avatar_url, None);
    }

    #[test]
    fn blank_names_fail_validation() {
        let input: ParticipantInput =
            serde_json::from_value(serde_json::json!({"name": "  "})).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn duplicate_roster_ids_fail_validation() {
        let id = Uuid::new_v4();
        let request: CreateMatchRequest = serde_json::from_value(serde_json::json!({
            "name": "Pelada",
            "participants": [
                {"id": id, "name": "Careca"},
                {"id": id, "name": "Careca de novo"}
            ]
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("participants"));
    }

    #[test]
    fn update_only_touches_provided_fields() {
        let mut participant = ParticipantInput {
            player: PlayerInput {
                id: None,
                name: "Bebeto".into(),
                avatar_url: Some("https://img/bebeto.png".into()),
                position: "Atacante".into(),
                skill_rating: Some(RawSkillRating::Number(4.0)),
            },
            confirmed: false,
        }
        .into_participant();

        let update: UpdateParticipantRequest =
            serde_json::from_value(serde_json::json!({"confirmed": true, "avatar_url": null}))
                .unwrap();
        update.apply_to(&mut participant);

        assert!(participant.confirmed);
        assert_eq!(participant.player.avatar_url, None);
        assert_eq!(participant.player.name, "Bebeto");
        assert_eq!(participant.player.skill.value(), 4.0);
    }
}
