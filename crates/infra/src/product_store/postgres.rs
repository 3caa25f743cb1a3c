//! Postgres-backed product store.
//!
//! Ownership-scoped mutations filter on `id = $1 AND seller_id = $2` and lock
//! the row they change, so a non-owner can never race the owner. Updates are a
//! single statement; deletes decode the locked row before removing it, inside
//! one transaction.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database, check violation (`23514`) | `Backend` (domain validation runs first, so this signals drift) |
//! | Database (other) | `Backend` |
//! | PoolClosed / network / decode | `Backend` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use bazaar_core::{ProductId, UserId};
use bazaar_products::product::{LIMITED_STOCK_THRESHOLD, StoredProduct};
use bazaar_products::{ImageRef, Product, ProductDraft, ProductPatch};

use super::r#trait::{ProductStore, StoreError, UpdatedProduct};

const PRODUCT_COLUMNS: &str = "p.id, p.seller_id, p.name, p.description, p.price, p.quantity, \
     p.category, p.images, p.rating, p.num_reviews, p.created_at, p.updated_at";

/// Postgres-backed product store.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: Arc<PgPool>,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `products` table and its seller index if missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                seq          BIGSERIAL,
                id           UUID PRIMARY KEY,
                seller_id    UUID NOT NULL,
                name         TEXT NOT NULL,
                description  TEXT NOT NULL,
                price        DOUBLE PRECISION NOT NULL CHECK (price >= 0),
                quantity     BIGINT NOT NULL CHECK (quantity >= 0),
                category     TEXT NOT NULL,
                images       JSONB NOT NULL,
                stock_status TEXT NOT NULL,
                rating       DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (rating >= 0 AND rating <= 5),
                num_reviews  BIGINT NOT NULL DEFAULT 0 CHECK (num_reviews >= 0),
                created_at   TIMESTAMPTZ NOT NULL,
                updated_at   TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_products_table", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS products_seller_seq_idx ON products (seller_id, seq)")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_products_index", e))?;

        Ok(())
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    #[instrument(skip(self, draft), fields(seller_id = %seller_id), err)]
    async fn create(&self, seller_id: UserId, draft: ProductDraft) -> Result<Product, StoreError> {
        let product = Product::create(ProductId::new(), seller_id, draft, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, seller_id, name, description, price, quantity, category,
                images, stock_status, rating, num_reviews, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(product.id_typed().as_uuid())
        .bind(product.seller_id().as_uuid())
        .bind(product.name())
        .bind(product.description())
        .bind(product.price())
        .bind(product.quantity() as i64)
        .bind(product.category())
        .bind(Json(product.images().to_vec()))
        .bind(product.stock_status().as_str())
        .bind(product.rating())
        .bind(product.num_reviews() as i64)
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn find_by_id(&self, id: ProductId) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?
            .ok_or(StoreError::NotFound)?;

        product_from_row(&row)
    }

    #[instrument(skip(self), fields(seller_id = %seller_id), err)]
    async fn find_by_seller(&self, seller_id: UserId) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.seller_id = $1 ORDER BY p.seq ASC"
        ))
        .bind(seller_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_seller", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products p ORDER BY p.seq ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_all", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, patch), fields(product_id = %id, seller_id = %seller_id), err)]
    async fn update_owned(
        &self,
        id: ProductId,
        seller_id: UserId,
        patch: ProductPatch,
    ) -> Result<UpdatedProduct, StoreError> {
        patch.validate()?;
        let images_patched = patch.images.is_some();

        // One statement: the CTE locks the owned row, the UPDATE applies the patch
        // and reports the image set it replaced.
        let row = sqlx::query(&format!(
            r#"
            WITH prev AS (
                SELECT id, images AS prev_images
                FROM products
                WHERE id = $1 AND seller_id = $2
                FOR UPDATE
            )
            UPDATE products p SET
                name         = COALESCE($3, p.name),
                description  = COALESCE($4, p.description),
                price        = COALESCE($5, p.price),
                quantity     = COALESCE($6, p.quantity),
                category     = COALESCE($7, p.category),
                images       = COALESCE($8, p.images),
                stock_status = CASE
                    WHEN COALESCE($6, p.quantity) = 0 THEN 'out_of_stock'
                    WHEN COALESCE($6, p.quantity) < $10 THEN 'limited_stock'
                    ELSE 'in_stock'
                END,
                updated_at   = $9
            FROM prev
            WHERE p.id = prev.id
            RETURNING {PRODUCT_COLUMNS}, prev.prev_images
            "#
        ))
        .bind(id.as_uuid())
        .bind(seller_id.as_uuid())
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.quantity)
        .bind(patch.category)
        .bind(patch.images.map(Json))
        .bind(Utc::now())
        .bind(LIMITED_STOCK_THRESHOLD as i64)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_owned", e))?
        .ok_or(StoreError::NotFound)?;

        let product = product_from_row(&row)?;
        let replaced_images = if images_patched {
            let Json(prev): Json<Vec<ImageRef>> = row
                .try_get("prev_images")
                .map_err(|e| map_sqlx_error("decode_prev_images", e))?;
            prev
        } else {
            Vec::new()
        };

        Ok(UpdatedProduct {
            product,
            replaced_images,
        })
    }

    #[instrument(skip(self), fields(product_id = %id, seller_id = %seller_id), err)]
    async fn delete_owned(&self, id: ProductId, seller_id: UserId) -> Result<Product, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_delete", e))?;

        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1 AND p.seller_id = $2 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .bind(seller_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_owned", e))?
        .ok_or(StoreError::NotFound)?;

        // A row that fails to decode is left in place, images included.
        let product = product_from_row(&row)?;

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_owned", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_delete", e))?;

        Ok(product)
    }
}

fn product_from_row(row: &sqlx::postgres::PgRow) -> Result<Product, StoreError> {
    let decode = |e| map_sqlx_error("decode_product", e);
    let Json(images): Json<Vec<ImageRef>> = row.try_get("images").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    let stored = StoredProduct {
        id: ProductId::from_uuid(row.try_get("id").map_err(decode)?),
        seller_id: UserId::from_uuid(row.try_get("seller_id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        price: row.try_get("price").map_err(decode)?,
        quantity: row.try_get("quantity").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        images,
        rating: row.try_get("rating").map_err(decode)?,
        num_reviews: row.try_get("num_reviews").map_err(decode)?,
        created_at,
        updated_at,
    };

    Product::restore(stored).map_err(|e| StoreError::Backend(format!("corrupt product row: {e}")))
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.code().as_deref() == Some("23514") {
                tracing::error!(operation, "check constraint rejected a validated product");
            }
            StoreError::Backend(msg)
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Runs against `TEST_DATABASE_URL`; each test is a no-op when it is unset.
#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> Option<PostgresProductStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.expect("failed to connect to test database");
        let store = PostgresProductStore::new(pool);
        store.ensure_schema().await.unwrap();
        Some(store)
    }

    fn draft(images: Vec<ImageRef>) -> ProductDraft {
        ProductDraft {
            name: "Beeswax candle".to_string(),
            description: "Hand-poured, 8h burn time.".to_string(),
            price: 9.5,
            quantity: 30,
            category: "home".to_string(),
            images,
        }
    }

    #[tokio::test]
    async fn image_replacement_reports_previous_images() {
        let Some(store) = store().await else { return };
        let seller = UserId::new();
        let original = vec![ImageRef::local("uploads/1-candle.png")];
        let product = store.create(seller, draft(original.clone())).await.unwrap();

        let fresh = vec![ImageRef::external("https://cdn.example.com/candle.jpg")];
        let updated = store
            .update_owned(
                product.id_typed(),
                seller,
                ProductPatch {
                    images: Some(fresh.clone()),
                    quantity: Some(4),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.replaced_images, original);
        assert_eq!(updated.product.images(), fresh.as_slice());
        assert_eq!(updated.product.stock_status().as_str(), "limited_stock");
    }

    #[tokio::test]
    async fn undecodable_row_survives_delete() {
        let Some(store) = store().await else { return };
        let seller = UserId::new();
        let product = store
            .create(seller, draft(vec![ImageRef::local("uploads/2-candle.png")]))
            .await
            .unwrap();

        // Drift the row out of the product invariants.
        sqlx::query("UPDATE products SET images = '[]'::jsonb WHERE id = $1")
            .bind(product.id_typed().as_uuid())
            .execute(&*store.pool)
            .await
            .unwrap();

        let err = store.delete_owned(product.id_typed(), seller).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = $1")
            .bind(product.id_typed().as_uuid())
            .fetch_one(&*store.pool)
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
