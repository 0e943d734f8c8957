use mongodb::bson::{Bson, DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{MatchEntity, ParticipantEntity, TeamAssignmentEntity};

/// Match document. Identifiers are stored as hyphenated strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    venue: Option<String>,
    #[serde(default)]
    scheduled_at: Option<DateTime>,
    created_at: DateTime,
    updated_at: DateTime,
    #[serde(default)]
    participants: Vec<MongoParticipantDocument>,
    #[serde(default)]
    team_count: i64,
    #[serde(default)]
    team_assignments: Vec<MongoAssignmentDocument>,
    #[serde(default)]
    revision: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    player_id: String,
    name: String,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    position: String,
    skill_rating: f64,
    #[serde(default)]
    confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAssignmentDocument {
    player_id: String,
    team: String,
}

impl From<MatchEntity> for MongoMatchDocument {
    fn from(value: MatchEntity) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name,
            venue: value.venue,
            scheduled_at: value.scheduled_at.map(DateTime::from_system_time),
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            participants: value.participants.into_iter().map(Into::into).collect(),
            team_count: to_bson_int(value.team_count as u64),
            team_assignments: value.team_assignments.into_iter().map(Into::into).collect(),
            revision: to_bson_int(value.revision),
        }
    }
}

impl TryFrom<MongoMatchDocument> for MatchEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoMatchDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(&value.id)?,
            name: value.name,
            venue: value.venue,
            scheduled_at: value.scheduled_at.map(DateTime::to_system_time),
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            participants: value
                .participants
                .into_iter()
                .map(TryInto::try_into)
                .collect::<MongoResult<_>>()?,
            team_count: usize::try_from(value.team_count).unwrap_or_default(),
            team_assignments: value
                .team_assignments
                .into_iter()
                .map(TryInto::try_into)
                .collect::<MongoResult<_>>()?,
            revision: u64::try_from(value.revision).unwrap_or_default(),
        })
    }
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            player_id: value.player_id.to_string(),
            name: value.name,
            avatar_url: value.avatar_url,
            position: value.position,
            skill_rating: value.skill_rating,
            confirmed: value.confirmed,
        }
    }
}

impl TryFrom<MongoParticipantDocument> for ParticipantEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoParticipantDocument) -> MongoResult<Self> {
        Ok(Self {
            player_id: parse_id(&value.player_id)?,
            name: value.name,
            avatar_url: value.avatar_url,
            position: value.position,
            skill_rating: value.skill_rating,
            confirmed: value.confirmed,
        })
    }
}

impl From<TeamAssignmentEntity> for MongoAssignmentDocument {
    fn from(value: TeamAssignmentEntity) -> Self {
        Self {
            player_id: value.player_id.to_string(),
            team: value.team,
        }
    }
}

impl TryFrom<MongoAssignmentDocument> for TeamAssignmentEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoAssignmentDocument) -> MongoResult<Self> {
        Ok(Self {
            player_id: parse_id(&value.player_id)?,
            team: value.team,
        })
    }
}

/// BSON array holding the given assignments, ready for a `$set` update.
pub fn assignments_bson(assignments: Vec<TeamAssignmentEntity>) -> Bson {
    Bson::Array(
        assignments
            .into_iter()
            .map(|assignment| {
                Bson::Document(doc! {
                    "player_id": assignment.player_id.to_string(),
                    "team": assignment.team,
                })
            })
            .collect(),
    )
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

/// Filter matching the match `id` only while it is still at `revision`.
///
/// Documents written before revisions existed count as revision 0.
pub fn revision_filter(id: Uuid, revision: u64) -> Document {
    if revision == 0 {
        doc! {
            "_id": id.to_string(),
            "$or": [{"revision": 0_i64}, {"revision": {"$exists": false}}],
        }
    } else {
        doc! {"_id": id.to_string(), "revision": to_bson_int(revision)}
    }
}

/// BSON has no unsigned integers; counters saturate at `i64::MAX`.
pub fn to_bson_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn parse_id(value: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(value).map_err(|source| MongoDaoError::InvalidId {
        value: value.to_owned(),
        source,
    })
}
