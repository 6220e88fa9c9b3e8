use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result of a MongoDB store operation.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
/// Failures of the MongoDB store.
pub enum MongoDaoError {
    /// Required variable is unset.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar {
        /// Variable name.
        var: &'static str,
    },
    /// Connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as given.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Server never answered during startup.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Attempts made.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Periodic ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection name.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Id counter update failed.
    #[error("failed to allocate next id for `{counter}`")]
    NextId {
        /// Counter name.
        counter: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Counter upsert returned nothing.
    #[error("counter `{counter}` returned no document")]
    MissingCounter {
        /// Counter name.
        counter: &'static str,
    },
    /// Query failed.
    #[error("failed to read from collection `{collection}`")]
    Read {
        /// Collection name.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Insert, update or delete failed.
    #[error("failed to write to collection `{collection}`")]
    Write {
        /// Collection name.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
