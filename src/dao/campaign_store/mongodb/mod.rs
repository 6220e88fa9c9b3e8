mod config;
mod connection;
mod error;
mod models;
/// Store implementation and connection lifecycle.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoCampaignStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::MissingCounter { .. } => StorageError::Malformed(err.to_string()),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
