use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{ParticipantEntity, TeamAssignmentEntity};

/// Skill assumed when a rating is missing or cannot be parsed (midpoint of the 1-5 scale).
pub const DEFAULT_SKILL: f64 = 3.0;
/// Substring identifying a goalkeeper inside the free-text position field.
const GOALKEEPER_MARKER: &str = "goleiro";

/// Numeric skill rating, parsed once when a player enters the system.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillRating(f64);

impl SkillRating {
    /// Wrap an already numeric rating, falling back to [`DEFAULT_SKILL`] for non-finite values.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            // Normalizes -0.0 so it ties with 0.0.
            Self(value + 0.0)
        } else {
            Self::default()
        }
    }

    /// Parse a textual rating. Missing, blank or unparsable input yields [`DEFAULT_SKILL`].
    ///
    /// A comma is accepted as decimal separator (`"4,5"` is read as `4.5`).
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .filter(|value| !value.is_empty())
            .and_then(|value| value.replace(',', ".").parse::<f64>().ok())
            .map(Self::new)
            .unwrap_or_default()
    }

    /// Raw numeric value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for SkillRating {
    fn default() -> Self {
        Self(DEFAULT_SKILL)
    }
}

impl fmt::Display for SkillRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-text playing position as typed by the player or an organizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    /// Wrap a position as typed.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Position text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the position mentions "goleiro", ignoring case.
    pub fn is_goalkeeper(&self) -> bool {
        self.0.to_lowercase().contains(GOALKEEPER_MARKER)
    }
}

/// Player eligible for team balancing.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Opaque identity of the player.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Optional avatar reference (URL or storage key).
    pub avatar_url: Option<String>,
    /// Playing position.
    pub position: Position,
    /// Skill used as the draft sort key.
    pub skill: SkillRating,
}

impl Player {
    /// See [`Position::is_goalkeeper`].
    pub fn is_goalkeeper(&self) -> bool {
        self.position.is_goalkeeper()
    }
}

/// A player registered for a match, with their attendance status.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    /// Player details.
    pub player: Player,
    /// Only confirmed participants are drafted into teams.
    pub confirmed: bool,
}

impl From<ParticipantEntity> for Participant {
    fn from(entity: ParticipantEntity) -> Self {
        Self {
            player: Player {
                id: entity.player_id,
                name: entity.name,
                avatar_url: entity.avatar_url,
                position: Position::new(entity.position),
                skill: SkillRating::new(entity.skill_rating),
            },
            confirmed: entity.confirmed,
        }
    }
}

impl From<Participant> for ParticipantEntity {
    fn from(participant: Participant) -> Self {
        let Participant { player, confirmed } = participant;
        Self {
            player_id: player.id,
            name: player.name,
            avatar_url: player.avatar_url,
            position: player.position.0,
            skill_rating: player.skill.value(),
            confirmed,
        }
    }
}

/// Team label given to a single player by a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamAssignment {
    /// Drafted player.
    pub player_id: Uuid,
    /// Team label.
    pub team: String,
}

impl From<TeamAssignment> for TeamAssignmentEntity {
    fn from(value: TeamAssignment) -> Self {
        Self {
            player_id: value.player_id,
            team: value.team,
        }
    }
}

impl From<TeamAssignmentEntity> for TeamAssignment {
    fn from(value: TeamAssignmentEntity) -> Self {
        Self {
            player_id: value.player_id,
            team: value.team,
        }
    }
}
