//! MongoDB match store: one document per match in the `matches` collection.

mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoMatchStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::Conflict { .. } => StorageError::conflict(err.to_string()),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn revision_conflicts_stay_conflicts() {
        let err: StorageError = MongoDaoError::Conflict {
            id: Uuid::nil(),
            revision: 2,
        }
        .into();
        assert!(matches!(err, StorageError::Conflict { .. }));

        let err: StorageError = MongoDaoError::MissingEnvVar { var: "MONGO_URI" }.into();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }
}
