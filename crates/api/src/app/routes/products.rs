//! Public catalog browse.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    response::IntoResponse,
};

use bazaar_core::ProductId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.browse_products().await {
        Ok(products) => Json(dto::products_envelope(&products)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match errors::parse_id(&id, "product id") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.catalog.get_product(product_id).await {
        Ok(product) => Json(dto::ProductEnvelope::new(&product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}
