use axum::{
    Router,
    routing::{get, post, put},
};

pub mod products;
pub mod seller;
pub mod system;

/// Endpoints open to anonymous callers: catalog browse and seller storefronts.
pub fn public_router() -> Router {
    Router::new()
        .route("/products", get(products::list_products))
        .route("/products/:id", get(products::get_product))
        .route("/seller/:seller_id/products", get(seller::list_products))
        .route(
            "/seller/:seller_id/products/:product_id",
            get(seller::get_product),
        )
}

/// Endpoints that require a bearer token.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/seller/products", post(seller::add_product))
        .route(
            "/seller/:seller_id/products/:product_id",
            put(seller::update_product).delete(seller::delete_product),
        )
}
