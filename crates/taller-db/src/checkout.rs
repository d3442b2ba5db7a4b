//! # Sale Orchestrator
//!
//! Turns a batch of requested sale lines plus payment metadata into one
//! committed sale, honoring all-or-nothing semantics across the batch.
//!
//! ## Checkout Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      process_sale(lines, payment)                   │
//! │                                                                     │
//! │  1. Shape checks (no side effects, no connection yet)               │
//! │     └── empty batch, quantity ≤ 0, negative payment figures         │
//! │                                                                     │
//! │  ─────────────── BEGIN TRANSACTION ───────────────                  │
//! │                                                                     │
//! │  2. Resolve + snapshot every line, in submitted order               │
//! │     └── unknown product ⇒ abort whole batch                         │
//! │  3. total = Σ subtotal; reject deposit > total                      │
//! │  4. Guarded decrement per line, ascending product id                │
//! │     └── insufficient stock ⇒ transaction rolls back, so earlier     │
//! │         lines of this same batch are undone                         │
//! │  5. Insert sale + lines                                             │
//! │                                                                     │
//! │  ──────────────────── COMMIT ─────────────────────                  │
//! │                                                                     │
//! │  6. Return CompletedSale (lines + low-stock alerts)                 │
//! │                                                                     │
//! │  The caller observes either full application or none. A second      │
//! │  reader can never see a partial sale.                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lock Ordering
//! Decrements are applied in ascending `(product_id, submitted index)`
//! order. Two concurrent batches touching the same two products therefore
//! request them in the same order and cannot deadlock each other.

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, EngineResult};
use crate::repository::product::ProductRepository;
use crate::repository::sale::{self, SaleRepository};
use taller_core::{
    compute_payment, validation, CompletedSale, CoreError, LowStockAlert, Money, PaymentInput,
    Sale, SaleLine, SaleLineRequest,
};

/// The Sale Orchestrator.
///
/// Holds only the pool; every checkout runs on its own transaction.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService { pool }
    }

    /// Processes a point-of-sale transaction.
    ///
    /// ## Errors
    /// - `EmptySale` / `InvalidQuantity` - rejected before any I/O
    /// - `ProductNotFound` - any unknown line aborts the whole batch,
    ///   including lines that validated earlier
    /// - `InvalidDeposit` - deposit exceeds the computed total
    /// - `InsufficientStock` - carries the failing line's detail; every
    ///   decrement already applied in this batch is rolled back
    ///
    /// On every error path the transaction aborts, so no stock change and
    /// no partial sale is ever observable.
    pub async fn process_sale(
        &self,
        lines: &[SaleLineRequest],
        payment: &PaymentInput,
    ) -> EngineResult<CompletedSale> {
        // Step 1: shape checks before a connection is even acquired.
        validation::validate_sale_request(lines, payment)?;

        debug!(lines = lines.len(), method = ?payment.method, "Starting checkout");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        // Step 2: resolve and snapshot every line in submitted order.
        // Name and price are frozen here, under the same transaction that
        // will decrement stock.
        let sale_id = sale::generate_sale_id();
        let now = Utc::now();
        let mut sale_lines: Vec<SaleLine> = Vec::with_capacity(lines.len());

        for request in lines {
            let product = ProductRepository::get_active_on(&mut *tx, &request.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(request.product_id.clone()))?;

            let subtotal = product.unit_price().multiply_quantity(request.quantity);

            sale_lines.push(SaleLine {
                id: sale::generate_sale_line_id(),
                sale_id: sale_id.clone(),
                product_id: product.id,
                name_snapshot: product.name,
                unit_price_cents: product.unit_price_cents,
                quantity: request.quantity,
                subtotal_cents: subtotal.cents(),
                created_at: now,
            });
        }

        // Step 3: total is known now; enforce the deposit bound before
        // any mutation.
        let total: Money = sale_lines.iter().map(SaleLine::subtotal).sum();
        if payment.deposit_cents > total.cents() {
            return Err(CoreError::InvalidDeposit {
                deposit_cents: payment.deposit_cents,
                total_cents: total.cents(),
            }
            .into());
        }

        // Step 4: apply decrements in ascending (product_id, submitted
        // index) order. Any failure aborts the transaction, undoing the
        // decrements already applied for this batch.
        let mut order: Vec<usize> = (0..sale_lines.len()).collect();
        order.sort_by(|&a, &b| {
            sale_lines[a]
                .product_id
                .cmp(&sale_lines[b].product_id)
                .then(a.cmp(&b))
        });

        let mut alerts: BTreeMap<String, LowStockAlert> = BTreeMap::new();
        for idx in order {
            let line = &sale_lines[idx];
            let decrement =
                ProductRepository::apply_decrement_on(&mut *tx, &line.product_id, line.quantity)
                    .await?;

            // Last decrement of a product wins; once low, stays low.
            if decrement.low_stock {
                alerts.insert(
                    line.product_id.clone(),
                    LowStockAlert {
                        product_id: line.product_id.clone(),
                        name: line.name_snapshot.clone(),
                        stock_on_hand: decrement.new_stock,
                        reorder_threshold: decrement.reorder_threshold,
                    },
                );
            }
        }

        // Step 5: payment summary and the durable record, same transaction
        // as the decrements.
        let breakdown = compute_payment(
            total,
            payment.deposit(),
            payment.method,
            payment.amount_tendered(),
        );

        let sale = Sale {
            id: sale_id,
            total_cents: total.cents(),
            payment_method: payment.method,
            amount_tendered_cents: payment.amount_tendered_cents,
            deposit_cents: payment.deposit_cents,
            change_cents: breakdown.change_due.cents(),
            balance_cents: breakdown.balance_remaining.cents(),
            created_at: now,
        };

        SaleRepository::insert_sale_on(&mut *tx, &sale).await?;
        for line in &sale_lines {
            SaleRepository::insert_line_on(&mut *tx, line).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            total = %total,
            lines = sale_lines.len(),
            alerts = alerts.len(),
            "Sale committed"
        );

        Ok(CompletedSale {
            sale,
            lines: sale_lines,
            low_stock_alerts: alerts.into_values().collect(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::pool::{Database, DbConfig};
    use taller_core::{PaymentMethod, Product};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed(db: &Database, id: &str, price_cents: i64, stock: i64, threshold: i64) {
        let now = Utc::now();
        db.products()
            .insert(&Product {
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
            })
            .await
            .unwrap();
    }

    fn line(product_id: &str, quantity: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .stock_on_hand
    }

    #[tokio::test]
    async fn test_multi_line_cash_sale() {
        // Product A $100.00 stock 10/2, Product B $50.00 stock 3/1
        // Sale A×2 + B×1, cash, $300.00 tendered
        let db = test_db().await;
        seed(&db, "a", 10_000, 10, 2).await;
        seed(&db, "b", 5000, 3, 1).await;

        let completed = db
            .checkout()
            .process_sale(&[line("a", 2), line("b", 1)], &PaymentInput::cash(30_000))
            .await
            .unwrap();

        assert_eq!(completed.sale.total_cents, 25_000);
        assert_eq!(completed.sale.change_cents, 5000);
        assert_eq!(completed.sale.balance_cents, 0);
        assert_eq!(completed.lines.len(), 2);
        assert_eq!(completed.lines[0].subtotal_cents, 20_000);
        assert_eq!(completed.lines[1].subtotal_cents, 5000);
        assert!(completed.low_stock_alerts.is_empty());

        assert_eq!(stock_of(&db, "a").await, 8);
        assert_eq!(stock_of(&db, "b").await, 2);

        // Durable: header and lines are readable back
        let stored = db
            .sales()
            .get_by_id(&completed.sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_cents, 25_000);
        let stored_lines = db.sales().get_lines(&completed.sale.id).await.unwrap();
        assert_eq!(stored_lines.len(), 2);
    }

    #[tokio::test]
    async fn test_total_conserves_line_subtotals() {
        let db = test_db().await;
        seed(&db, "a", 9999, 50, 0).await;
        seed(&db, "b", 12_345, 50, 0).await;

        let completed = db
            .checkout()
            .process_sale(
                &[line("a", 3), line("b", 7), line("a", 2)],
                &PaymentInput {
                    method: PaymentMethod::Transfer,
                    amount_tendered_cents: 200_000,
                    deposit_cents: 0,
                },
            )
            .await
            .unwrap();

        let sum: i64 = completed.lines.iter().map(|l| l.subtotal_cents).sum();
        assert_eq!(completed.sale.total_cents, sum);
        for l in &completed.lines {
            assert_eq!(l.subtotal_cents, l.quantity * l.unit_price_cents);
        }
        // Duplicate product lines both applied: 50 - 3 - 2
        assert_eq!(stock_of(&db, "a").await, 45);
        // Transfer never produces change
        assert_eq!(completed.sale.change_cents, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_whole_batch() {
        // B×5 against stock 3 fails; A (which sorts first and was already
        // decremented inside the transaction) must come back untouched.
        let db = test_db().await;
        seed(&db, "a", 10_000, 10, 2).await;
        seed(&db, "b", 5000, 3, 1).await;

        let err = db
            .checkout()
            .process_sale(&[line("a", 1), line("b", 5)], &PaymentInput::cash(50_000))
            .await
            .unwrap_err();

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

        assert_eq!(stock_of(&db, "a").await, 10);
        assert_eq!(stock_of(&db, "b").await, 3);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_aborts_before_any_mutation() {
        let db = test_db().await;
        seed(&db, "a", 10_000, 10, 2).await;

        let err = db
            .checkout()
            .process_sale(&[line("a", 2), line("ghost", 1)], &PaymentInput::cash(50_000))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::ProductNotFound(ref id)) if id == "ghost"
        ));
        assert_eq!(stock_of(&db, "a").await, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_low_stock_alert_on_threshold() {
        // Product C $20.00 stock 5, threshold 5: selling one fires the alert
        let db = test_db().await;
        seed(&db, "c", 2000, 5, 5).await;

        let completed = db
            .checkout()
            .process_sale(&[line("c", 1)], &PaymentInput::cash(2000))
            .await
            .unwrap();

        assert_eq!(completed.sale.total_cents, 2000);
        assert_eq!(stock_of(&db, "c").await, 4);
        assert_eq!(completed.low_stock_alerts.len(), 1);
        let alert = &completed.low_stock_alerts[0];
        assert_eq!(alert.product_id, "c");
        assert_eq!(alert.stock_on_hand, 4);
        assert_eq!(alert.reorder_threshold, 5);
    }

    #[tokio::test]
    async fn test_deposit_above_total_rejected_without_mutation() {
        // Total $600.00, deposit $700.00
        let db = test_db().await;
        seed(&db, "a", 60_000, 10, 2).await;

        let err = db
            .checkout()
            .process_sale(
                &[line("a", 1)],
                &PaymentInput {
                    method: PaymentMethod::Cash,
                    amount_tendered_cents: 70_000,
                    deposit_cents: 70_000,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::InvalidDeposit {
                deposit_cents: 70_000,
                total_cents: 60_000,
            })
        ));
        assert_eq!(stock_of(&db, "a").await, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deposit_sale_carries_balance() {
        let db = test_db().await;
        seed(&db, "a", 60_000, 10, 2).await;

        let completed = db
            .checkout()
            .process_sale(
                &[line("a", 1)],
                &PaymentInput {
                    method: PaymentMethod::Cash,
                    amount_tendered_cents: 15_000,
                    deposit_cents: 15_000,
                },
            )
            .await
            .unwrap();

        assert_eq!(completed.sale.deposit_cents, 15_000);
        assert_eq!(completed.sale.balance_cents, 45_000);
        assert_eq!(completed.sale.change_cents, 0);
    }

    #[tokio::test]
    async fn test_empty_and_invalid_requests_rejected() {
        let db = test_db().await;
        seed(&db, "a", 10_000, 10, 2).await;

        let err = db
            .checkout()
            .process_sale(&[], &PaymentInput::cash(0))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Rejected(CoreError::EmptySale)));

        let err = db
            .checkout()
            .process_sale(&[line("a", 0)], &PaymentInput::cash(0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::InvalidQuantity { .. })
        ));

        assert_eq!(stock_of(&db, "a").await, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_oversell_under_concurrency() {
        // One unit left, two concurrent sales of one unit each:
        // exactly one succeeds, the loser sees InsufficientStock,
        // and the final stock is zero.
        let db = test_db().await;
        seed(&db, "last", 99_900, 1, 0).await;

        let c1 = db.checkout();
        let c2 = db.checkout();

        let lines1 = [line("last", 1)];
        let lines2 = [line("last", 1)];
        let pay1 = PaymentInput::cash(99_900);
        let pay2 = PaymentInput::cash(99_900);
        let (r1, r2) = tokio::join!(
            c1.process_sale(&lines1, &pay1),
            c2.process_sale(&lines2, &pay2),
        );

        let ok = [r1.is_ok(), r2.is_ok()].iter().filter(|&&b| b).count();
        assert_eq!(ok, 1, "exactly one of the two sales must succeed");

        let loser = if r1.is_err() { r1.unwrap_err() } else { r2.unwrap_err() };
        assert!(matches!(
            loser,
            EngineError::Rejected(CoreError::InsufficientStock { available: 0, .. })
        ));

        assert_eq!(stock_of(&db, "last").await, 0);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }
}
