//! Process-local store used when no database is configured, and by tests.

use std::{cmp::Reverse, collections::BTreeMap, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    campaign_store::CampaignStore,
    models::{LiveStateEntity, ProductEntity, ProductFields, TemplateEntity, TemplateFields},
    storage::StorageResult,
};

/// Store keeping everything in maps behind a lock; contents are lost on exit.
#[derive(Clone, Default)]
pub struct MemoryCampaignStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    products: BTreeMap<i64, ProductEntity>,
    templates: BTreeMap<i64, TemplateEntity>,
    live_state: Option<LiveStateEntity>,
    last_product_id: i64,
    last_template_id: i64,
}

impl MemoryCampaignStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CampaignStore for MemoryCampaignStore {
    fn list_products(&self) -> BoxFuture<'static, StorageResult<Vec<ProductEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            let mut products: Vec<_> = guard.products.values().cloned().collect();
            products.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
            Ok(products)
        })
    }

    fn create_product(&self, product: ProductFields) -> BoxFuture<'static, StorageResult<ProductEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            guard.last_product_id += 1;
            let entity = product.with_id(guard.last_product_id);
            guard.products.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn update_product(
        &self,
        id: i64,
        product: ProductFields,
    ) -> BoxFuture<'static, StorageResult<Option<ProductEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let Some(slot) = guard.products.get_mut(&id) else {
                return Ok(None);
            };
            *slot = product.with_id(id);
            Ok(Some(slot.clone()))
        })
    }

    fn delete_product(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.products.remove(&id).is_some()) })
    }

    fn list_templates(&self) -> BoxFuture<'static, StorageResult<Vec<TemplateEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            let mut templates: Vec<_> = guard.templates.values().cloned().collect();
            templates.sort_by_key(|t| Reverse((t.created_at, t.id)));
            Ok(templates)
        })
    }

    fn find_template(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<TemplateEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.templates.get(&id).cloned()) })
    }

    fn create_template(
        &self,
        template: TemplateFields,
    ) -> BoxFuture<'static, StorageResult<TemplateEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            guard.last_template_id += 1;
            let entity = template.with_id(guard.last_template_id, SystemTime::now());
            guard.templates.insert(entity.id, entity.clone());
            Ok(entity)
        })
    }

    fn delete_template(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.templates.remove(&id).is_some()) })
    }

    fn load_live_state(&self) -> BoxFuture<'static, StorageResult<Option<LiveStateEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.live_state.clone()) })
    }

    fn save_live_state(&self, state: LiveStateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.live_state = Some(state);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, category: &str) -> ProductFields {
        ProductFields {
            name: name.into(),
            icon_url: "🍺".into(),
            base_price: 100.0,
            category: category.into(),
        }
    }

    #[tokio::test]
    async fn products_are_listed_by_category_then_name() {
        let store = MemoryCampaignStore::new();
        store.create_product(product("Tonic", "drinks")).await.unwrap();
        store.create_product(product("Nachos", "food")).await.unwrap();
        store.create_product(product("Ale", "drinks")).await.unwrap();

        let names: Vec<_> = store
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Ale", "Tonic", "Nachos"]);
    }

    #[tokio::test]
    async fn update_and_delete_report_unknown_ids() {
        let store = MemoryCampaignStore::new();
        let created = store.create_product(product("Ale", "drinks")).await.unwrap();

        assert!(store.update_product(99, product("X", "y")).await.unwrap().is_none());
        let updated = store
            .update_product(created.id, product("Stout", "drinks"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Stout");

        assert!(store.delete_product(created.id).await.unwrap());
        assert!(!store.delete_product(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn templates_are_listed_newest_first() {
        let store = MemoryCampaignStore::new();
        for name in ["first", "second"] {
            store
                .create_template(TemplateFields {
                    name: name.into(),
                    slot_type: "triple".into(),
                    config: "{}".into(),
                })
                .await
                .unwrap();
        }
        let names: Vec<_> = store
            .list_templates()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["second", "first"]);
    }
}
