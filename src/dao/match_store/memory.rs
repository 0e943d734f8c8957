//! Process-local match store backed by a concurrent map.

use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    match_store::MatchStore,
    models::{MatchEntity, MatchListItemEntity, TeamDrawEntity},
    storage::{StorageError, StorageResult},
};

/// Volatile [`MatchStore`]; data is lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryMatchStore {
    matches: Arc<DashMap<Uuid, MatchEntity>>,
}

impl MemoryMatchStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn stale(id: Uuid, read: u64, stored: u64) -> StorageError {
    StorageError::conflict(format!(
        "match `{id}` is at revision {stored}, write was based on {read}"
    ))
}

impl MatchStore for MemoryMatchStore {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let matches = self.matches.clone();
        Box::pin(async move {
            matches.insert(entity.id, entity);
            Ok(())
        })
    }

    fn update_match(&self, mut entity: MatchEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let matches = self.matches.clone();
        Box::pin(async move {
            // The entry guard holds the shard lock across compare and swap.
            let Some(mut stored) = matches.get_mut(&entity.id) else {
                return Ok(false);
            };
            if stored.revision != entity.revision {
                return Err(stale(entity.id, entity.revision, stored.revision));
            }
            entity.revision += 1;
            *stored = entity;
            Ok(true)
        })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let matches = self.matches.clone();
        Box::pin(async move { Ok(matches.get(&id).map(|entry| entry.value().clone())) })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchListItemEntity>>> {
        let matches = self.matches.clone();
        Box::pin(async move {
            Ok(matches
                .iter()
                .map(|entry| entry.value().clone().into())
                .collect())
        })
    }

    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let matches = self.matches.clone();
        Box::pin(async move { Ok(matches.remove(&id).is_some()) })
    }

    fn save_team_draw(
        &self,
        match_id: Uuid,
        revision: u64,
        draw: TeamDrawEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let matches = self.matches.clone();
        Box::pin(async move {
            let Some(mut stored) = matches.get_mut(&match_id) else {
                return Ok(false);
            };
            if stored.revision != revision {
                return Err(stale(match_id, revision, stored.revision));
            }
            stored.team_count = draw.team_count;
            stored.team_assignments = draw.assignments;
            stored.updated_at = SystemTime::now();
            stored.revision += 1;
            Ok(true)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
