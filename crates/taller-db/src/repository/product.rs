//! # Product Ledger
//!
//! The sole authority over `stock_on_hand`. Catalog reads and writes live
//! here too, but the invariant this module exists for is stock:
//!
//! ## Guarded Single-Statement Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Decrement Strategy                         │
//! │                                                                     │
//! │  ❌ WRONG: read-check-write split across round trips                │
//! │     SELECT stock_on_hand ...          (reads 1)                     │
//! │     if stock >= qty { UPDATE ... }    (another writer ran between)  │
//! │     → classic lost update: two sales of the last unit both succeed  │
//! │                                                                     │
//! │  ✅ CORRECT: the check and the write are one atomic statement       │
//! │     UPDATE products                                                 │
//! │     SET stock_on_hand = stock_on_hand - ?qty                        │
//! │     WHERE id = ?id AND stock_on_hand >= ?qty                        │
//! │     RETURNING stock_on_hand, reorder_threshold                      │
//! │                                                                     │
//! │  Zero rows updated means the guard failed: the product is missing   │
//! │  or the stock cannot cover the request. Either way, no mutation.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, EngineResult};
use taller_core::{validation, CoreError, Product};

/// Outcome of one applied stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    /// Stock remaining after the decrement.
    pub new_stock: i64,

    /// Reorder threshold of the product at decrement time.
    pub reorder_threshold: i64,

    /// Advisory: resulting stock is at or below the reorder threshold.
    /// Not an error - the decrement committed.
    pub low_stock: bool,
}

/// Repository for product and stock operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str = "id, code, name, description, unit_price_cents, \
     stock_on_hand, reorder_threshold, is_active, created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Stock adjustment (the ledger proper)
    // =========================================================================

    /// Atomically decrements stock for one product.
    ///
    /// ## Guarantee
    /// The availability check and the write are a single statement, so this
    /// is serialized against any other adjustment of the same row: two
    /// concurrent callers competing for the last units cannot both succeed.
    ///
    /// ## Errors
    /// - `ProductNotFound` if the id is unknown or the product is inactive
    /// - `InsufficientStock` if `quantity` exceeds the stock on hand
    ///   (state unchanged)
    /// - `InvalidQuantity` if `quantity <= 0`
    pub async fn apply_decrement(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<StockDecrement> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Self::apply_decrement_on(&mut conn, product_id, quantity).await
    }

    /// The decrement, on a caller-supplied connection.
    ///
    /// The checkout transaction uses this so that a whole batch of
    /// decrements plus the sale insert commit or roll back together.
    pub(crate) async fn apply_decrement_on(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> EngineResult<StockDecrement> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                product_id: product_id.to_string(),
                quantity,
            }
            .into());
        }

        let now = Utc::now();

        let updated: Option<(i64, i64)> = sqlx::query_as(
            r#"
            UPDATE products
            SET stock_on_hand = stock_on_hand - ?2,
                updated_at = ?3
            WHERE id = ?1 AND is_active = 1 AND stock_on_hand >= ?2
            RETURNING stock_on_hand, reorder_threshold
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DbError::from)?;

        match updated {
            Some((new_stock, reorder_threshold)) => {
                debug!(product_id = %product_id, quantity = %quantity, new_stock = %new_stock, "Stock decremented");
                Ok(StockDecrement {
                    new_stock,
                    reorder_threshold,
                    low_stock: new_stock <= reorder_threshold,
                })
            }
            None => {
                // Guard failed: distinguish "unknown product" from
                // "not enough stock" for the caller.
                let available: Option<i64> = sqlx::query_scalar(
                    "SELECT stock_on_hand FROM products WHERE id = ?1 AND is_active = 1",
                )
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(DbError::from)?;

                match available {
                    Some(available) => Err(CoreError::InsufficientStock {
                        product_id: product_id.to_string(),
                        requested: quantity,
                        available,
                    }
                    .into()),
                    None => Err(CoreError::ProductNotFound(product_id.to_string()).into()),
                }
            }
        }
    }

    /// Atomically increments stock (restocking). Same single-statement
    /// discipline as the decrement.
    pub async fn apply_restock(&self, product_id: &str, quantity: i64) -> EngineResult<i64> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                product_id: product_id.to_string(),
                quantity,
            }
            .into());
        }

        let now = Utc::now();

        let new_stock: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock_on_hand = stock_on_hand + ?2,
                updated_at = ?3
            WHERE id = ?1 AND is_active = 1
            RETURNING stock_on_hand
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        match new_stock {
            Some(new_stock) => {
                debug!(product_id = %product_id, quantity = %quantity, new_stock = %new_stock, "Stock replenished");
                Ok(new_stock)
            }
            None => Err(CoreError::ProductNotFound(product_id.to_string()).into()),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product on a caller-supplied connection.
    ///
    /// Used by the checkout transaction to snapshot name and price under
    /// the same transaction that will decrement stock.
    pub(crate) async fn get_active_on(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists active products at or below their reorder threshold.
    ///
    /// The standing restock report; the per-sale alerts come from the
    /// checkout result instead.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND stock_on_hand <= reorder_threshold \
             ORDER BY stock_on_hand ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Catalog writes (never touch stock except at insert)
    // =========================================================================

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> EngineResult<()> {
        validation::validate_product_name(&product.name).map_err(CoreError::from)?;
        validation::validate_price_cents(product.unit_price_cents).map_err(CoreError::from)?;
        validation::validate_stock_levels(product.stock_on_hand, product.reorder_threshold)
            .map_err(CoreError::from)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, unit_price_cents,
                stock_on_hand, reorder_threshold, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price_cents)
        .bind(product.stock_on_hand)
        .bind(product.reorder_threshold)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(())
    }

    /// Updates catalog fields: name, code, description, price, threshold,
    /// active flag. Deliberately excludes `stock_on_hand` - stock only
    /// moves through `apply_decrement` / `apply_restock`.
    pub async fn update_catalog(&self, product: &Product) -> EngineResult<()> {
        validation::validate_product_name(&product.name).map_err(CoreError::from)?;
        validation::validate_price_cents(product.unit_price_cents).map_err(CoreError::from)?;

        debug!(id = %product.id, "Updating product catalog fields");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                name = ?3,
                description = ?4,
                unit_price_cents = ?5,
                reorder_threshold = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price_cents)
        .bind(product.reorder_threshold)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(product.id.clone()).into());
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sale lines still reference the row, so it is never
    /// physically removed.
    pub async fn soft_delete(&self, id: &str) -> EngineResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        Ok(())
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::error::EngineError;
    use chrono::Utc;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(id: &str, price_cents: i64, stock: i64, threshold: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            code: None,
            name: format!("Producto {id}"),
            description: None,
            unit_price_cents: price_cents,
            stock_on_hand: stock,
            reorder_threshold: threshold,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("a", 10_000, 10, 2)).await.unwrap();

        let found = repo.get_by_id("a").await.unwrap().unwrap();
        assert_eq!(found.unit_price_cents, 10_000);
        assert_eq!(found.stock_on_hand, 10);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_bad_catalog_data() {
        let db = test_db().await;
        let repo = db.products();

        // Non-positive price
        assert!(repo.insert(&product("a", 0, 10, 2)).await.is_err());
        // Negative stock
        assert!(repo.insert(&product("b", 100, -1, 0)).await.is_err());
        // Threshold above stock
        assert!(repo.insert(&product("c", 100, 3, 5)).await.is_err());
        // Price so large a subtotal could overflow
        assert!(repo.insert(&product("d", i64::MAX / 2, 10, 2)).await.is_err());
    }

    #[tokio::test]
    async fn test_decrement_happy_path() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&product("a", 10_000, 10, 2)).await.unwrap();

        let result = repo.apply_decrement("a", 2).await.unwrap();
        assert_eq!(result.new_stock, 8);
        assert!(!result.low_stock);

        let stored = repo.get_by_id("a").await.unwrap().unwrap();
        assert_eq!(stored.stock_on_hand, 8);
    }

    #[tokio::test]
    async fn test_decrement_low_stock_at_threshold() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&product("c", 2000, 5, 5)).await.unwrap();

        // 5 -> 4, threshold 5: advisory fires
        let result = repo.apply_decrement("c", 1).await.unwrap();
        assert_eq!(result.new_stock, 4);
        assert!(result.low_stock);
    }

    #[tokio::test]
    async fn test_decrement_insufficient_stock_leaves_state_unchanged() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&product("b", 5000, 3, 1)).await.unwrap();

        let err = repo.apply_decrement("b", 5).await.unwrap_err();
        match err {
            EngineError::Rejected(CoreError::InsufficientStock {
                product_id,
                requested,
                available,
            }) => {
                assert_eq!(product_id, "b");
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(repo.get_by_id("b").await.unwrap().unwrap().stock_on_hand, 3);
    }

    #[tokio::test]
    async fn test_decrement_unknown_product() {
        let db = test_db().await;
        let err = db.products().apply_decrement("ghost", 1).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_decrement_rejects_non_positive_quantity() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&product("a", 10_000, 10, 2)).await.unwrap();

        for qty in [0, -3] {
            let err = repo.apply_decrement("a", qty).await.unwrap_err();
            assert!(matches!(
                err,
                EngineError::Rejected(CoreError::InvalidQuantity { .. })
            ));
        }
        assert_eq!(repo.get_by_id("a").await.unwrap().unwrap().stock_on_hand, 10);
    }

    #[tokio::test]
    async fn test_restock_then_decrement_symmetry() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&product("a", 10_000, 2, 1)).await.unwrap();

        assert_eq!(repo.apply_restock("a", 8).await.unwrap(), 10);
        let result = repo.apply_decrement("a", 8).await.unwrap();
        assert_eq!(result.new_stock, 2);
    }

    #[tokio::test]
    async fn test_soft_deleted_product_is_not_sellable() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&product("a", 10_000, 10, 2)).await.unwrap();
        repo.soft_delete("a").await.unwrap();

        let err = repo.apply_decrement("a", 1).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_low_stock() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&product("a", 10_000, 10, 2)).await.unwrap();
        repo.insert(&product("b", 5000, 1, 1)).await.unwrap();

        let low = repo.list_low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "b");
    }

    #[tokio::test]
    async fn test_update_catalog_does_not_touch_stock() {
        let db = test_db().await;
        let repo = db.products();
        repo.insert(&product("a", 10_000, 10, 2)).await.unwrap();

        let mut updated = repo.get_by_id("a").await.unwrap().unwrap();
        updated.name = "Pantalla OLED".to_string();
        updated.unit_price_cents = 12_000;
        updated.stock_on_hand = 999; // must be ignored
        repo.update_catalog(&updated).await.unwrap();

        let stored = repo.get_by_id("a").await.unwrap().unwrap();
        assert_eq!(stored.name, "Pantalla OLED");
        assert_eq!(stored.unit_price_cents, 12_000);
        assert_eq!(stored.stock_on_hand, 10);
    }
}
