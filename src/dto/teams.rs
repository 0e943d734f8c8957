//! DTO definitions for team draws.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{matches::PlayerInput, validation::validate_unique_player_ids},
    services::team_balancer::team_label,
    state::pelada::Player,
};

/// Request to draw teams for a stored match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DrawTeamsRequest {
    /// Number of teams to form.
    #[validate(range(min = 1))]
    pub team_count: usize,
    /// Shuffle the roster before drafting so equally rated players may swap teams.
    /// Falls back to the server default when omitted.
    #[serde(default)]
    pub reshuffle: Option<bool>,
}

/// Stateless balancing of an ad-hoc roster.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BalanceRequest {
    /// Number of teams to form.
    #[validate(range(min = 1))]
    pub team_count: usize,
    /// Roster to split; explicit ids must be unique.
    #[validate(nested, custom(function = "validate_unique_player_ids"))]
    pub players: Vec<PlayerInput>,
    /// Shuffle before drafting; server default when omitted.
    #[serde(default)]
    pub reshuffle: Option<bool>,
}

/// Player as listed inside a team.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct TeamPlayer {
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
}

impl From<&Player> for TeamPlayer {
    fn from(player: &Player) -> Self {
        Self {
            player_id: player.id,
            name: player.name.clone(),
            avatar_url: player.avatar_url.clone(),
            position: player.position.as_str().to_owned(),
            skill_rating: player.skill.value(),
            goalkeeper: player.is_goalkeeper(),
        }
    }
}

/// One drafted team with its skill totals.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct TeamSummary {
    /// Team label (`A`, `B`, ...).
    pub label: String,
    /// Players in draft order.
    pub players: Vec<TeamPlayer>,
    /// Goalkeepers on the team.
    pub goalkeepers: usize,
    /// Sum of the players' ratings.
    pub total_skill: f64,
    /// Absent for an empty team.
    pub average_skill: Option<f64>,
}

impl TeamSummary {
    /// Summarize `players` under `label`.
    pub fn new(label: String, players: &[Player]) -> Self {
        let total_skill: f64 = players.iter().map(|player| player.skill.value()).sum();
        let average_skill = if players.is_empty() {
            None
        } else {
            Some(total_skill / players.len() as f64)
        };
        Self {
            label,
            goalkeepers: players.iter().filter(|player| player.is_goalkeeper()).count(),
            players: players.iter().map(TeamPlayer::from).collect(),
            total_skill,
            average_skill,
        }
    }
}

/// Teams of a draw, in label order.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamsResponse {
    /// Match the teams belong to; absent for stateless previews.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
    /// Every team of the draw, empty ones included.
    pub teams: Vec<TeamSummary>,
    /// Confirmed players who joined after the draw and hold no team yet.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unassigned: Vec<TeamPlayer>,
}

impl TeamsResponse {
    /// Build a response from teams in draft order (`A`, `B`, ...).
    pub fn from_teams(match_id: Option<Uuid>, teams: &[Vec<Player>]) -> Self {
        Self {
            match_id,
            teams: teams
                .iter()
                .enumerate()
                .map(|(index, players)| TeamSummary::new(team_label(index), players))
                .collect(),
            unassigned: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::pelada::{Position, SkillRating};

    fn player(position: &str, skill: f64) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: "x".into(),
            avatar_url: None,
            position: Position::new(position),
            skill: SkillRating::new(skill),
        }
    }

    #[test]
    fn summary_totals_and_averages() {
        let summary = TeamSummary::new(
            "A".into(),
            &[player("Goleiro", 3.0), player("Meia", 5.0), player("", 1.0)],
        );

        assert_eq!(summary.goalkeepers, 1);
        assert_eq!(summary.total_skill, 9.0);
        assert_eq!(summary.average_skill, Some(3.0));
    }

    #[test]
    fn empty_team_has_no_average() {
        let summary = TeamSummary::new("C".into(), &[]);
        assert_eq!(summary.total_skill, 0.0);
        assert_eq!(summary.average_skill, None);
    }

    #[test]
    fn teams_are_labelled_in_order() {
        let response = TeamsResponse::from_teams(None, &[vec![], vec![], vec![]]);
        let labels: Vec<&str> = response.teams.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
    }

    #[test]
    fn balance_request_rejects_repeated_players() {
        let id = Uuid::new_v4();
        let request: BalanceRequest = serde_json::from_value(serde_json::json!({
            "team_count": 2,
            "players": [{"id": id, "name": "a"}, {"id": id, "name": "b"}]
        }))
        .unwrap();
        assert!(request.validate().is_err());

        let request: BalanceRequest = serde_json::from_value(serde_json::json!({
            "team_count": 2,
            "players": [{"name": "a", "skill_rating": "4,5"}, {"name": "b"}]
        }))
        .unwrap();
        assert!(request.validate().is_ok());
    }
}
