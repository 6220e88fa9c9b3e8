use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        LIVE_STATE_ID, MongoCounterDocument, MongoLiveStateDocument, MongoProductDocument,
        MongoTemplateDocument,
    },
};
use crate::dao::{
    campaign_store::CampaignStore,
    models::{LiveStateEntity, ProductEntity, ProductFields, TemplateEntity, TemplateFields},
    storage::StorageResult,
};

const PRODUCT_COLLECTION_NAME: &str = "products";
const TEMPLATE_COLLECTION_NAME: &str = "slot_templates";
const LIVE_STATE_COLLECTION_NAME: &str = "live_state";
const COUNTER_COLLECTION_NAME: &str = "counters";

/// Campaign store on top of a MongoDB database.
#[derive(Clone)]
pub struct MongoCampaignStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
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

impl MongoCampaignStore {
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
        let products = self.products().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"category": 1, "name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("product_category_name_idx".to_owned()))
                    .build(),
            )
            .build();
        products
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PRODUCT_COLLECTION_NAME,
                index: "category,name",
                source,
            })?;

        let templates = self.templates().await;
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"created_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("template_created_at_idx".to_owned()))
                    .build(),
            )
            .build();
        templates
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: TEMPLATE_COLLECTION_NAME,
                index: "created_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn products(&self) -> Collection<MongoProductDocument> {
        self.database().await.collection(PRODUCT_COLLECTION_NAME)
    }

    async fn templates(&self) -> Collection<MongoTemplateDocument> {
        self.database().await.collection(TEMPLATE_COLLECTION_NAME)
    }

    async fn live_state(&self) -> Collection<MongoLiveStateDocument> {
        self.database().await.collection(LIVE_STATE_COLLECTION_NAME)
    }

    /// Atomically bump and return the sequence stored under `counter`.
    async fn next_id(&self, counter: &'static str) -> MongoResult<i64> {
        let counters = self
            .database()
            .await
            .collection::<MongoCounterDocument>(COUNTER_COLLECTION_NAME);
        let document = counters
            .find_one_and_update(doc! {"_id": counter}, doc! {"$inc": {"seq": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextId { counter, source })?
            .ok_or(MongoDaoError::MissingCounter { counter })?;
        Ok(document.seq)
    }

    async fn list_products(&self) -> MongoResult<Vec<ProductEntity>> {
        let documents: Vec<MongoProductDocument> = self
            .products()
            .await
            .find(doc! {})
            .sort(doc! {"category": 1, "name": 1})
            .await
            .map_err(|source| read_error(PRODUCT_COLLECTION_NAME, source))?
            .try_collect()
            .await
            .map_err(|source| read_error(PRODUCT_COLLECTION_NAME, source))?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn create_product(&self, product: ProductFields) -> MongoResult<ProductEntity> {
        let id = self.next_id(PRODUCT_COLLECTION_NAME).await?;
        let entity = product.with_id(id);
        let document: MongoProductDocument = entity.clone().into();
        self.products()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| write_error(PRODUCT_COLLECTION_NAME, source))?;
        Ok(entity)
    }

    async fn update_product(
        &self,
        id: i64,
        product: ProductFields,
    ) -> MongoResult<Option<ProductEntity>> {
        let entity = product.with_id(id);
        let document: MongoProductDocument = entity.clone().into();
        let result = self
            .products()
            .await
            .replace_one(doc! {"_id": id}, &document)
            .await
            .map_err(|source| write_error(PRODUCT_COLLECTION_NAME, source))?;
        Ok((result.matched_count > 0).then_some(entity))
    }

    async fn delete_product(&self, id: i64) -> MongoResult<bool> {
        let result = self
            .products()
            .await
            .delete_one(doc! {"_id": id})
            .await
            .map_err(|source| write_error(PRODUCT_COLLECTION_NAME, source))?;
        Ok(result.deleted_count > 0)
    }

    async fn list_templates(&self) -> MongoResult<Vec<TemplateEntity>> {
        let documents: Vec<MongoTemplateDocument> = self
            .templates()
            .await
            .find(doc! {})
            .sort(doc! {"created_at": -1, "_id": -1})
            .await
            .map_err(|source| read_error(TEMPLATE_COLLECTION_NAME, source))?
            .try_collect()
            .await
            .map_err(|source| read_error(TEMPLATE_COLLECTION_NAME, source))?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_template(&self, id: i64) -> MongoResult<Option<TemplateEntity>> {
        let document = self
            .templates()
            .await
            .find_one(doc! {"_id": id})
            .await
            .map_err(|source| read_error(TEMPLATE_COLLECTION_NAME, source))?;
        Ok(document.map(Into::into))
    }

    async fn create_template(&self, template: TemplateFields) -> MongoResult<TemplateEntity> {
        let id = self.next_id(TEMPLATE_COLLECTION_NAME).await?;
        let entity = template.with_id(id, SystemTime::now());
        let document: MongoTemplateDocument = entity.clone().into();
        self.templates()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| write_error(TEMPLATE_COLLECTION_NAME, source))?;
        Ok(entity)
    }

    async fn delete_template(&self, id: i64) -> MongoResult<bool> {
        let result = self
            .templates()
            .await
            .delete_one(doc! {"_id": id})
            .await
            .map_err(|source| write_error(TEMPLATE_COLLECTION_NAME, source))?;
        Ok(result.deleted_count > 0)
    }

    async fn load_live_state(&self) -> MongoResult<Option<LiveStateEntity>> {
        let document = self
            .live_state()
            .await
            .find_one(doc! {"_id": LIVE_STATE_ID})
            .await
            .map_err(|source| read_error(LIVE_STATE_COLLECTION_NAME, source))?;
        Ok(document.map(Into::into))
    }

    async fn save_live_state(&self, state: LiveStateEntity) -> MongoResult<()> {
        let document: MongoLiveStateDocument = state.into();
        self.live_state()
            .await
            .replace_one(doc! {"_id": LIVE_STATE_ID}, &document)
            .upsert(true)
            .await
            .map_err(|source| write_error(LIVE_STATE_COLLECTION_NAME, source))?;
        Ok(())
    }
}

fn read_error(collection: &'static str, source: mongodb::error::Error) -> MongoDaoError {
    MongoDaoError::Read { collection, source }
}

fn write_error(collection: &'static str, source: mongodb::error::Error) -> MongoDaoError {
    MongoDaoError::Write { collection, source }
}

impl CampaignStore for MongoCampaignStore {
    fn list_products(&self) -> BoxFuture<'static, StorageResult<Vec<ProductEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_products().await.map_err(Into::into) })
    }

    fn create_product(&self, product: ProductFields) -> BoxFuture<'static, StorageResult<ProductEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_product(product).await.map_err(Into::into) })
    }

    fn update_product(
        &self,
        id: i64,
        product: ProductFields,
    ) -> BoxFuture<'static, StorageResult<Option<ProductEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.update_product(id, product).await.map_err(Into::into) })
    }

    fn delete_product(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_product(id).await.map_err(Into::into) })
    }

    fn list_templates(&self) -> BoxFuture<'static, StorageResult<Vec<TemplateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_templates().await.map_err(Into::into) })
    }

    fn find_template(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<TemplateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_template(id).await.map_err(Into::into) })
    }

    fn create_template(
        &self,
        template: TemplateFields,
    ) -> BoxFuture<'static, StorageResult<TemplateEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create_template(template).await.map_err(Into::into) })
    }

    fn delete_template(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_template(id).await.map_err(Into::into) })
    }

    fn load_live_state(&self) -> BoxFuture<'static, StorageResult<Option<LiveStateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_live_state().await.map_err(Into::into) })
    }

    fn save_live_state(&self, state: LiveStateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_live_state(state).await.map_err(Into::into) })
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
