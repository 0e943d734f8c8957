use std::{sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::dao::{
    match_store::MatchStore,
    models::{MatchEntity, MatchListItemEntity, TeamDrawEntity},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{AllDocsResponse, CouchMatchDocument, END_SUFFIX, MATCH_PREFIX, match_doc_id},
};

const ALL_DOCS: &str = "_all_docs";

/// [`MatchStore`] talking to CouchDB over its HTTP API.
///
/// Each match is one document, so every write (including a whole team draw) is a
/// single revisioned `PUT` that either fully applies or fails with a conflict.
/// Updates are checked against the revision the caller read before the `PUT`
/// pins CouchDB's own `_rev`.
#[derive(Clone)]
pub struct CouchMatchStore {
    client: Client,
    database_url: Arc<str>,
    credentials: Option<Arc<(String, String)>>,
}

impl CouchMatchStore {
    /// Build the HTTP client and create the database when it is missing.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let store = Self {
            client,
            database_url: Arc::from(format!(
                "{}/{}",
                config.base_url.trim_end_matches('/'),
                config.database
            )),
            credentials: config.credentials.map(Arc::new),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn request(&self, method: Method, path: Option<&str>) -> RequestBuilder {
        let url = match path {
            Some(path) => format!("{}/{path}", self.database_url),
            None => self.database_url.to_string(),
        };
        let builder = self.client.request(method, url);
        match self.credentials.as_deref() {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder, path: &str) -> CouchResult<Response> {
        builder.send().await.map_err(|source| CouchDaoError::Transport {
            path: path.to_owned(),
            source,
        })
    }

    /// Accept 2xx, turn 409 into [`CouchDaoError::Conflict`], reject anything else.
    fn expect_written(response: &Response, path: &str) -> CouchResult<()> {
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                path: path.to_owned(),
            }),
            status => Err(CouchDaoError::UnexpectedStatus {
                path: path.to_owned(),
                status,
            }),
        }
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let path = self.database_url.to_string();
        let response = Self::send(self.request(Method::GET, None), &path).await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = Self::send(self.request(Method::PUT, None), &path).await?;
                match created.status() {
                    // 412: another instance created it in the meantime.
                    status if status.is_success() || status == StatusCode::PRECONDITION_FAILED => {
                        Ok(())
                    }
                    status => Err(CouchDaoError::UnexpectedStatus { path, status }),
                }
            }
            status => Err(CouchDaoError::UnexpectedStatus { path, status }),
        }
    }

    async fn get_document<T: DeserializeOwned>(&self, doc_id: &str) -> CouchResult<Option<T>> {
        let response = Self::send(self.request(Method::GET, Some(doc_id)), doc_id).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response
                    .json::<T>()
                    .await
                    .map(Some)
                    .map_err(|source| CouchDaoError::Decode {
                        path: doc_id.to_owned(),
                        source,
                    })
            }
            status => Err(CouchDaoError::UnexpectedStatus {
                path: doc_id.to_owned(),
                status,
            }),
        }
    }

    async fn put_document<T: Serialize>(&self, doc_id: &str, document: &T) -> CouchResult<()> {
        let builder = self.request(Method::PUT, Some(doc_id)).json(document);
        let response = Self::send(builder, doc_id).await?;
        Self::expect_written(&response, doc_id)
    }

    async fn load(&self, id: Uuid) -> CouchResult<Option<CouchMatchDocument>> {
        self.get_document(&match_doc_id(id)).await
    }

    async fn list_matches(&self) -> CouchResult<Vec<CouchMatchDocument>> {
        let query = [
            ("include_docs", "true".to_owned()),
            ("startkey", format!("\"{MATCH_PREFIX}\"")),
            ("endkey", format!("\"{MATCH_PREFIX}{END_SUFFIX}\"")),
        ];
        let builder = self.request(Method::GET, Some(ALL_DOCS)).query(&query);
        let response = Self::send(builder, ALL_DOCS).await?;

        if !response.status().is_success() {
            return Err(CouchDaoError::UnexpectedStatus {
                path: ALL_DOCS.to_owned(),
                status: response.status(),
            });
        }

        let payload = response
            .json::<AllDocsResponse>()
            .await
            .map_err(|source| CouchDaoError::Decode {
                path: ALL_DOCS.to_owned(),
                source,
            })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                serde_json::from_value(doc).map_err(|source| CouchDaoError::Malformed {
                    path: ALL_DOCS.to_owned(),
                    source,
                })
            })
            .collect()
    }

    async fn insert_match(&self, entity: MatchEntity) -> CouchResult<()> {
        let document = CouchMatchDocument::from_entity(entity, None);
        self.put_document(&document.id, &document).await
    }

    /// Load the current document and check it is still at `revision`.
    ///
    /// The returned document carries the `_rev` just read, so the following `PUT`
    /// also fails with 409 if anyone writes in between.
    async fn load_at(&self, id: Uuid, revision: u64) -> CouchResult<Option<CouchMatchDocument>> {
        let Some(document) = self.load(id).await? else {
            return Ok(None);
        };
        if document.body.revision != revision {
            return Err(CouchDaoError::Conflict { path: document.id });
        }
        Ok(Some(document))
    }

    async fn update_match(&self, mut entity: MatchEntity) -> CouchResult<bool> {
        let Some(current) = self.load_at(entity.id, entity.revision).await? else {
            return Ok(false);
        };
        entity.revision += 1;
        let document = CouchMatchDocument::from_entity(entity, current.rev);
        self.put_document(&document.id, &document).await?;
        Ok(true)
    }

    async fn save_team_draw(
        &self,
        id: Uuid,
        revision: u64,
        draw: TeamDrawEntity,
    ) -> CouchResult<bool> {
        let Some(mut document) = self.load_at(id, revision).await? else {
            return Ok(false);
        };
        document.body.team_count = draw.team_count;
        document.body.team_assignments = draw.assignments;
        document.body.updated_at = SystemTime::now();
        document.body.revision += 1;
        self.put_document(&document.id, &document).await?;
        Ok(true)
    }

    async fn delete_match(&self, id: Uuid) -> CouchResult<bool> {
        let Some(CouchMatchDocument {
            id: doc_id,
            rev: Some(rev),
            ..
        }) = self.load(id).await?
        else {
            return Ok(false);
        };

        let builder = self
            .request(Method::DELETE, Some(&doc_id))
            .query(&[("rev", rev.as_str())]);
        let response = Self::send(builder, &doc_id).await?;
        Self::expect_written(&response, &doc_id)?;
        Ok(true)
    }

    async fn ping(&self) -> CouchResult<()> {
        let path = self.database_url.to_string();
        let response = Self::send(self.request(Method::GET, None), &path).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::UnexpectedStatus {
                path,
                status: response.status(),
            })
        }
    }
}

impl MatchStore for CouchMatchStore {
    fn insert_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.insert_match(entity).await?) })
    }

    fn update_match(&self, entity: MatchEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.update_match(entity).await?) })
    }

    fn find_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store.load(id).await?;
            Ok(document.map(CouchMatchDocument::into_entity).transpose()?)
        })
    }

    fn list_matches(&self) -> BoxFuture<'static, StorageResult<Vec<MatchListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents = store.list_matches().await?;
            let mut items = Vec::with_capacity(documents.len());
            for document in documents {
                items.push(document.into_entity()?.into());
            }
            Ok(items)
        })
    }

    fn delete_match(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.delete_match(id).await?) })
    }

    fn save_team_draw(
        &self,
        match_id: Uuid,
        revision: u64,
        draw: TeamDrawEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.save_team_draw(match_id, revision, draw).await?) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ping().await?) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ensure_database().await?) })
    }
}
