use std::fmt;

use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// What the store was doing when the driver failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Ping,
    EnsureIndex(&'static str),
    InsertMatch(Uuid),
    UpdateMatch(Uuid),
    LoadMatch(Uuid),
    DeleteMatch(Uuid),
    ListMatches,
    SaveAssignments(Uuid),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Ping => write!(f, "ping"),
            Operation::EnsureIndex(index) => write!(f, "creation of index `{index}`"),
            Operation::InsertMatch(id) => write!(f, "insertion of match `{id}`"),
            Operation::UpdateMatch(id) => write!(f, "update of match `{id}`"),
            Operation::LoadMatch(id) => write!(f, "load of match `{id}`"),
            Operation::DeleteMatch(id) => write!(f, "deletion of match `{id}`"),
            Operation::ListMatches => write!(f, "match listing"),
            Operation::SaveAssignments(id) => write!(f, "team draw write for match `{id}`"),
        }
    }
}

/// Failures of the MongoDB match store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// Required environment variable is missing.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// `MONGO_URI` is not a valid connection string.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    /// The initial ping never succeeded.
    #[error("MongoDB did not answer after {attempts} ping attempt(s)")]
    Unreachable {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    /// A driver call failed.
    #[error("MongoDB {operation} failed")]
    Operation {
        operation: Operation,
        #[source]
        source: MongoError,
    },
    /// The document moved past the revision the write was based on.
    #[error("match `{id}` changed after revision {revision} was read")]
    Conflict { id: Uuid, revision: u64 },
    /// A stored id is not a UUID.
    #[error("stored document holds an invalid identifier `{value}`")]
    InvalidId {
        value: String,
        #[source]
        source: uuid::Error,
    },
}

impl MongoDaoError {
    /// Adapter for `map_err` on driver calls.
    pub fn during(operation: Operation) -> impl FnOnce(MongoError) -> Self {
        move |source| MongoDaoError::Operation { operation, source }
    }
}
