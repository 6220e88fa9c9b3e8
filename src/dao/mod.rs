/// Product, template and campaign record persistence.
pub mod campaign_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
