/// In-process store.
pub mod memory;
/// MongoDB-backed store.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    LiveStateEntity, ProductEntity, ProductFields, TemplateEntity, TemplateFields,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for the product catalogue, slot
/// templates and the singleton campaign record.
pub trait CampaignStore: Send + Sync {
    /// Products ordered by category, then name.
    fn list_products(&self) -> BoxFuture<'static, StorageResult<Vec<ProductEntity>>>;
    /// Insert a product under a freshly allocated id.
    fn create_product(&self, product: ProductFields) -> BoxFuture<'static, StorageResult<ProductEntity>>;
    /// Returns `None` when no product has this id.
    fn update_product(
        &self,
        id: i64,
        product: ProductFields,
    ) -> BoxFuture<'static, StorageResult<Option<ProductEntity>>>;
    /// Returns `false` when no product has this id.
    fn delete_product(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;
    /// Templates ordered newest first.
    fn list_templates(&self) -> BoxFuture<'static, StorageResult<Vec<TemplateEntity>>>;
    /// Template by id, if any.
    fn find_template(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<TemplateEntity>>>;
    /// Insert a template, stamping its id and creation time.
    fn create_template(
        &self,
        template: TemplateFields,
    ) -> BoxFuture<'static, StorageResult<TemplateEntity>>;
    /// Returns `false` when no template has this id.
    fn delete_template(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;
    /// The persisted campaign record, `None` on first boot.
    fn load_live_state(&self) -> BoxFuture<'static, StorageResult<Option<LiveStateEntity>>>;
    /// Upsert the campaign record.
    fn save_live_state(&self, state: LiveStateEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap round trip proving the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
