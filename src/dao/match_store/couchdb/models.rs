use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::{CouchDaoError, CouchResult};
use crate::dao::models::{MatchEntity, ParticipantEntity, TeamAssignmentEntity};

pub const MATCH_PREFIX: &str = "match::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

/// Match document; the whole roster and the team assignments live in it so a
/// draw is a single revisioned write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchMatchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub body: MatchBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchBody {
    pub name: String,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<SystemTime>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    #[serde(default)]
    pub participants: Vec<ParticipantEntity>,
    #[serde(default)]
    pub team_count: usize,
    #[serde(default)]
    pub team_assignments: Vec<TeamAssignmentEntity>,
    /// Application-level write counter, independent of CouchDB's `_rev`.
    #[serde(default)]
    pub revision: u64,
}

impl CouchMatchDocument {
    pub fn from_entity(entity: MatchEntity, rev: Option<String>) -> Self {
        Self {
            id: match_doc_id(entity.id),
            rev,
            body: MatchBody {
                name: entity.name,
                venue: entity.venue,
                scheduled_at: entity.scheduled_at,
                created_at: entity.created_at,
                updated_at: entity.updated_at,
                participants: entity.participants,
                team_count: entity.team_count,
                team_assignments: entity.team_assignments,
                revision: entity.revision,
            },
        }
    }

    pub fn into_entity(self) -> CouchResult<MatchEntity> {
        let id = parse_match_doc_id(&self.id)?;
        let MatchBody {
            name,
            venue,
            scheduled_at,
            created_at,
            updated_at,
            participants,
            team_count,
            team_assignments,
            revision,
        } = self.body;
        Ok(MatchEntity {
            id,
            name,
            venue,
            scheduled_at,
            created_at,
            updated_at,
            participants,
            team_count,
            team_assignments,
            revision,
        })
    }
}

pub fn match_doc_id(id: Uuid) -> String {
    format!("{MATCH_PREFIX}{id}")
}

fn parse_match_doc_id(doc_id: &str) -> CouchResult<Uuid> {
    let raw = doc_id.strip_prefix(MATCH_PREFIX).unwrap_or(doc_id);
    Uuid::parse_str(raw).map_err(|source| CouchDaoError::InvalidDocId {
        doc_id: doc_id.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_carry_match_prefix() {
        let id = Uuid::new_v4();
        let doc_id = match_doc_id(id);
        assert!(doc_id.starts_with(MATCH_PREFIX));
        assert_eq!(parse_match_doc_id(&doc_id).unwrap(), id);
    }

    #[test]
    fn malformed_document_id_is_rejected() {
        assert!(matches!(
            parse_match_doc_id("match::not-a-uuid"),
            Err(CouchDaoError::InvalidDocId { .. })
        ));
    }

    #[test]
    fn revision_is_omitted_for_new_documents() {
        let now = SystemTime::now();
        let entity = MatchEntity {
            id: Uuid::new_v4(),
            name: "Pelada de sábado".into(),
            venue: Some("Aterro".into()),
            scheduled_at: None,
            created_at: now,
            updated_at: now,
            participants: Vec::new(),
            team_count: 0,
            team_assignments: Vec::new(),
            revision: 0,
        };

        let value = serde_json::to_value(CouchMatchDocument::from_entity(entity, None)).unwrap();

        assert!(value.get("_rev").is_none());
        assert_eq!(value["name"], "Pelada de sábado");
        assert_eq!(value["revision"], 0);
    }

    #[test]
    fn documents_without_counters_read_as_undrawn() {
        let document: CouchMatchDocument = serde_json::from_value(serde_json::json!({
            "_id": match_doc_id(Uuid::nil()),
            "_rev": "1-abc",
            "name": "Pelada antiga",
            "created_at": {"secs_since_epoch": 0, "nanos_since_epoch": 0},
            "updated_at": {"secs_since_epoch": 0, "nanos_since_epoch": 0},
        }))
        .unwrap();

        let entity = document.into_entity().unwrap();
        assert_eq!(entity.team_count, 0);
        assert_eq!(entity.revision, 0);
        assert!(entity.team_assignments.is_empty());
    }
}
