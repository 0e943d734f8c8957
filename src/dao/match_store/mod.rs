/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{MatchEntity, MatchListItemEntity, TeamDrawEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for matches and their rosters.
///
/// Writes to an existing match are optimistic: they carry the revision the caller
/// read and fail with [`StorageError::Conflict`] when another writer got there first.
///
/// [`StorageError::Conflict`]: crate::dao::storage::StorageError::Conflict
pub trait MatchStore: Send + Sync {
    /// Store a new match as is, revision included.
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace a match read at `entity.revision`, storing it under the next revision.
    ///
    /// Returns `false` when the match no longer exists.
    fn update_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Load a match, `None` when the id is unknown.
    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    /// Summaries of every stored match, in no particular order.
    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchListItemEntity>>>;
    /// Returns `false` when no match had this id.
    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Replace the team count and every assignment of a match read at `revision`,
    /// in one atomic write.
    ///
    /// Either the whole draw is stored or nothing is. Returns `false` when the
    /// match does not exist.
    fn save_team_draw(
        &self,
        match_id: Uuid,
        revision: u64,
        draw: TeamDrawEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection in place.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
