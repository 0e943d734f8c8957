use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, Operation},
    models::{MongoMatchDocument, assignments_bson, doc_id, revision_filter, to_bson_int},
};
use crate::dao::{
    match_store::MatchStore,
    models::{MatchEntity, MatchListItemEntity, TeamDrawEntity},
    storage::StorageResult,
};

const MATCH_COLLECTION_NAME: &str = "matches";
const SCHEDULED_AT_INDEX: &str = "match_scheduled_at_idx";

/// [`MatchStore`] keeping one document per match, roster and assignments embedded.
///
/// Embedding the assignments lets a whole draw be written with a single-document
/// update, which MongoDB applies atomically. Writes filter on the `revision` field
/// they were based on, so a stale write matches nothing and is reported as a conflict.
#[derive(Clone)]
pub struct MongoMatchStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    // Kept so the connection pool lives as long as the database handle.
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.state.read().await.database.clone();

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(MongoDaoError::during(Operation::Ping))?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"scheduled_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some(SCHEDULED_AT_INDEX.to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(MongoDaoError::during(Operation::EnsureIndex(SCHEDULED_AT_INDEX)))?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoMatchDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
    }

    async fn insert_match(&self, entity: MatchEntity) -> MongoResult<()> {
        let id = entity.id;
        let document: MongoMatchDocument = entity.into();
        self.collection()
            .await
            .insert_one(&document)
            .await
            .map_err(MongoDaoError::during(Operation::InsertMatch(id)))?;
        Ok(())
    }

    async fn update_match(&self, mut entity: MatchEntity) -> MongoResult<bool> {
        let (id, read) = (entity.id, entity.revision);
        entity.revision = read + 1;
        let document: MongoMatchDocument = entity.into();
        let result = self
            .collection()
            .await
            .replace_one(revision_filter(id, read), &document)
            .await
            .map_err(MongoDaoError::during(Operation::UpdateMatch(id)))?;

        if result.matched_count > 0 {
            Ok(true)
        } else {
            self.missing_or_conflict(id, read).await
        }
    }

    /// Explain why a revision-filtered write matched nothing.
    async fn missing_or_conflict(&self, id: Uuid, revision: u64) -> MongoResult<bool> {
        let existing = self
            .collection()
            .await
            .count_documents(doc_id(id))
            .await
            .map_err(MongoDaoError::during(Operation::LoadMatch(id)))?;
        if existing == 0 {
            Ok(false)
        } else {
            Err(MongoDaoError::Conflict { id, revision })
        }
    }

    async fn find_match(&self, id: Uuid) -> MongoResult<Option<MatchEntity>> {
        let document = self
            .collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(MongoDaoError::during(Operation::LoadMatch(id)))?;

        document.map(TryInto::try_into).transpose()
    }

    async fn list_matches(&self) -> MongoResult<Vec<MatchListItemEntity>> {
        let documents: Vec<MongoMatchDocument> = self
            .collection()
            .await
            .find(doc! {})
            .await
            .map_err(MongoDaoError::during(Operation::ListMatches))?
            .try_collect()
            .await
            .map_err(MongoDaoError::during(Operation::ListMatches))?;

        documents
            .into_iter()
            .map(|document| MatchEntity::try_from(document).map(MatchListItemEntity::from))
            .collect()
    }

    async fn delete_match(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .collection()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(MongoDaoError::during(Operation::DeleteMatch(id)))?;
        Ok(result.deleted_count > 0)
    }

    async fn save_team_draw(
        &self,
        id: Uuid,
        revision: u64,
        draw: TeamDrawEntity,
    ) -> MongoResult<bool> {
        let update = doc! {
            "$set": {
                "team_count": to_bson_int(draw.team_count as u64),
                "team_assignments": assignments_bson(draw.assignments),
                "updated_at": DateTime::now(),
            },
            "$inc": {"revision": 1_i64},
        };
        let result = self
            .collection()
            .await
            .update_one(revision_filter(id, revision), update)
            .await
            .map_err(MongoDaoError::during(Operation::SaveAssignments(id)))?;

        if result.matched_count > 0 {
            Ok(true)
        } else {
            self.missing_or_conflict(id, revision).await
        }
    }
}

impl MatchStore for MongoMatchStore {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_match(entity).await.map_err(Into::into) })
    }

    fn update_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.update_match(entity).await.map_err(Into::into) })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches().await.map_err(Into::into) })
    }

    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_match(id).await.map_err(Into::into) })
    }

    fn save_team_draw(
        &self,
        match_id: Uuid,
        revision: u64,
        draw: TeamDrawEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_team_draw(match_id, revision, draw)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
