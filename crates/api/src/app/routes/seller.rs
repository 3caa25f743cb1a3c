//! Seller product management.
//!
//! Reads are public storefront views. Mutations act as the bearer identity, and
//! the `:seller_id` path segment must name that same identity.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
};

use bazaar_core::{ProductId, UserId};

use crate::app::dto::{self, ProductEnvelope, ProductForm};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::IdentityContext;

pub async fn add_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    multipart: Multipart,
) -> axum::response::Response {
    let form = match ProductForm::read(multipart).await {
        Ok(form) => form,
        Err(res) => return res,
    };
    let (draft, attachments, image_urls) = match form.into_draft() {
        Ok(parts) => parts,
        Err(e) => return errors::catalog_error_to_response(e.into()),
    };

    match services
        .catalog
        .add_product(caller.identity(), draft, attachments, image_urls)
        .await
    {
        Ok(product) => (
            StatusCode::CREATED,
            Json(ProductEnvelope::with_message(&product, "Product added successfully")),
        )
            .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Path(seller_id): Path<String>,
) -> axum::response::Response {
    let seller_id: UserId = match errors::parse_id(&seller_id, "seller id") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.catalog.list_seller_products(seller_id).await {
        Ok(products) => Json(dto::products_envelope(&products)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path((seller_id, product_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (seller_id, product_id) = match parse_path(&seller_id, &product_id) {
        Ok(ids) => ids,
        Err(res) => return res,
    };

    match services
        .catalog
        .get_seller_product(seller_id, product_id)
        .await
    {
        Ok(product) => Json(ProductEnvelope::new(&product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path((seller_id, product_id)): Path<(String, String)>,
    multipart: Multipart,
) -> axum::response::Response {
    let product_id = match authorize_path(&caller, &seller_id, &product_id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let form = match ProductForm::read(multipart).await {
        Ok(form) => form,
        Err(res) => return res,
    };
    let (patch, attachments, image_urls) = match form.into_patch() {
        Ok(parts) => parts,
        Err(e) => return errors::catalog_error_to_response(e.into()),
    };

    match services
        .catalog
        .update_seller_product(caller.identity(), product_id, patch, attachments, image_urls)
        .await
    {
        Ok(product) => Json(ProductEnvelope::with_message(
            &product,
            "Product updated successfully",
        ))
        .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<IdentityContext>,
    Path((seller_id, product_id)): Path<(String, String)>,
) -> axum::response::Response {
    let product_id = match authorize_path(&caller, &seller_id, &product_id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services
        .catalog
        .delete_seller_product(caller.identity(), product_id)
        .await
    {
        Ok(confirmation) => Json(dto::deleted_envelope(&confirmation)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

fn parse_path(
    seller_id: &str,
    product_id: &str,
) -> Result<(UserId, ProductId), axum::response::Response> {
    Ok((
        errors::parse_id(seller_id, "seller id")?,
        errors::parse_id(product_id, "product id")?,
    ))
}

/// Sellers may only mutate under their own `:seller_id`.
fn authorize_path(
    caller: &IdentityContext,
    seller_id: &str,
    product_id: &str,
) -> Result<ProductId, axum::response::Response> {
    let (seller_id, product_id) = parse_path(seller_id, product_id)?;
    if seller_id != caller.user_id() {
        return Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "cannot manage another seller's products",
        ));
    }
    Ok(product_id)
}
