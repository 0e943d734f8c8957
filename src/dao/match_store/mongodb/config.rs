use std::env;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const URI_ENV: &str = "MONGO_URI";
const DATABASE_ENV: &str = "MONGO_DB";
const DEFAULT_DATABASE: &str = "pelada";
const APP_NAME: &str = "pelada-back";

/// Parsed client options plus the database holding the `matches` collection.
#[derive(Clone)]
pub struct MongoConfig {
    /// Driver options, app name included.
    pub options: ClientOptions,
    /// Database holding the `matches` collection.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection string. The database defaults to `pelada`.
    pub async fn parse(uri: &str, database_name: Option<String>) -> MongoResult<Self> {
        let mut options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        Ok(Self {
            options,
            database_name: database_name.unwrap_or_else(|| DEFAULT_DATABASE.to_owned()),
        })
    }

    /// Read `MONGO_URI` (required) and `MONGO_DB` (optional).
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var(URI_ENV).map_err(|_| MongoDaoError::MissingEnvVar { var: URI_ENV })?;
        let database_name = env::var(DATABASE_ENV)
            .ok()
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        Self::parse(&uri, database_name).await
    }
}
