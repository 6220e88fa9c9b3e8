use tracing::info;

use crate::{
    dto::product::{ProductDto, ProductInput},
    error::ServiceError,
    state::{SharedState, campaign::Product},
};

/// Catalogue ordered by category, then name.
pub async fn list_products(state: &SharedState) -> Result<Vec<ProductDto>, ServiceError> {
    let store = state.require_store().await?;
    Ok(store
        .list_products()
        .await?
        .into_iter()
        .map(|entity| ProductDto::from(Product::from(entity)))
        .collect())
}

/// Insert a validated product.
pub async fn create_product(
    state: &SharedState,
    input: ProductInput,
) -> Result<ProductDto, ServiceError> {
    let store = state.require_store().await?;
    let entity = store.create_product(input.into()).await?;
    info!(id = entity.id, name = %entity.name, "product created");
    Ok(ProductDto::from(Product::from(entity)))
}

/// Replace a product; unknown ids are `NotFound`.
pub async fn update_product(
    state: &SharedState,
    id: i64,
    input: ProductInput,
) -> Result<ProductDto, ServiceError> {
    let store = state.require_store().await?;
    let entity = store
        .update_product(id, input.into())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))?;
    info!(id, "product updated");
    Ok(ProductDto::from(Product::from(entity)))
}

/// Remove a product. Slots still referencing it render as empty.
pub async fn delete_product(state: &SharedState, id: i64) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_product(id).await? {
        return Err(ServiceError::NotFound(format!("product {id}")));
    }
    info!(id, "product deleted");
    Ok(())
}
