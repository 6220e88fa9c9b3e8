use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::ProductFields, dto::validation::validate_not_blank, state::campaign::Product,
};

/// Catalogue entry as exposed over HTTP.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    /// Image URL or glyph.
    pub icon_url: String,
    pub base_price: f64,
    pub category: String,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            icon_url: product.icon_url,
            base_price: product.base_price,
            category: product.category,
        }
    }
}

/// Body of product create and update requests.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ProductInput {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    pub icon_url: String,
    #[validate(range(min = 0.0))]
    pub base_price: f64,
    #[serde(default)]
    pub category: String,
}

impl From<ProductInput> for ProductFields {
    fn from(input: ProductInput) -> Self {
        Self {
            name: input.name.trim().to_owned(),
            icon_url: input.icon_url,
            base_price: input.base_price,
            category: input.category,
        }
    }
}
