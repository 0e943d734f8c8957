use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Player registered for a match, as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantEntity {
    /// Stable identifier of the player.
    pub player_id: Uuid,
    /// Display name of the player.
    pub name: String,
    /// Optional avatar reference.
    pub avatar_url: Option<String>,
    /// Free-text playing position.
    pub position: String,
    /// Skill rating, already parsed and defaulted at ingestion.
    pub skill_rating: f64,
    /// Whether the player confirmed attendance.
    pub confirmed: bool,
}

/// Team label assigned to a player by the last draw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamAssignmentEntity {
    /// Player receiving the label.
    pub player_id: Uuid,
    /// Team label (`A`, `B`, ...).
    pub team: String,
}

/// Aggregate match entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEntity {
    /// Primary key of the match.
    pub id: Uuid,
    /// Display name of the match.
    pub name: String,
    /// Where the match is played.
    pub venue: Option<String>,
    /// Scheduled kick-off time.
    pub scheduled_at: Option<SystemTime>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the match was updated.
    pub updated_at: SystemTime,
    /// Registered players, in registration order.
    pub participants: Vec<ParticipantEntity>,
    /// Number of teams formed by the last draw, `0` when no draw happened.
    ///
    /// Kept apart from the assignments because a draw may leave teams empty.
    pub team_count: usize,
    /// Team labels produced by the last draw.
    pub team_assignments: Vec<TeamAssignmentEntity>,
    /// Write counter. Stores only accept a write carrying the revision they hold,
    /// and bump it on success.
    pub revision: u64,
}

/// Outcome of a team draw, written in one piece.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamDrawEntity {
    /// Number of teams formed, empty ones included.
    pub team_count: usize,
    /// One label per drafted player.
    pub assignments: Vec<TeamAssignmentEntity>,
}

/// Match list item entity (subset of MatchEntity).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchListItemEntity {
    /// Primary key of the match.
    pub id: Uuid,
    /// Display name of the match.
    pub name: String,
    /// Scheduled kick-off time.
    pub scheduled_at: Option<SystemTime>,
    /// Creation timestamp, used to order listings.
    pub created_at: SystemTime,
    /// Last time the match was updated.
    pub updated_at: SystemTime,
    /// Number of registered players.
    pub participant_count: usize,
    /// Number of players who confirmed attendance.
    pub confirmed_count: usize,
    /// Whether teams were drawn for this match.
    pub teams_drawn: bool,
}

impl From<MatchEntity> for MatchListItemEntity {
    fn from(entity: MatchEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            scheduled_at: entity.scheduled_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            participant_count: entity.participants.len(),
            confirmed_count: entity.participants.iter().filter(|p| p.confirmed).count(),
            teams_drawn: entity.team_count > 0,
        }
    }
}
