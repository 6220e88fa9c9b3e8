use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use axum_valid::Valid;

use crate::{
    dto::product::{ProductDto, ProductInput},
    error::AppError,
    services::product_service,
    state::SharedState,
};

/// Product catalogue endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            put(update_product).delete(delete_product),
        )
}

/// Product catalogue.
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "products",
    responses((status = 200, description = "Products ordered by category and name", body = [ProductDto]))
)]
pub async fn list_products(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ProductDto>>, AppError> {
    Ok(Json(product_service::list_products(&state).await?))
}

/// Add a product to the catalogue.
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = ProductDto),
        (status = 400, description = "Invalid product")
    )
)]
pub async fn create_product(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ProductInput>>,
) -> Result<(StatusCode, Json<ProductDto>), AppError> {
    let product = product_service::create_product(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's fields.
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Identifier of the product to update")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = ProductDto),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn update_product(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Valid(Json(payload)): Valid<Json<ProductInput>>,
) -> Result<Json<ProductDto>, AppError> {
    Ok(Json(
        product_service::update_product(&state, id, payload).await?,
    ))
}

/// Delete a product. Slots referencing it render as empty afterwards.
/// Remove a product.
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Identifier of the product to delete")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Unknown product")
    )
)]
pub async fn delete_product(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    product_service::delete_product(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
