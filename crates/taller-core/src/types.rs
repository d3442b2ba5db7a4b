//! # Domain Types
//!
//! Core domain types for the sale & inventory engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                               │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────────┐     │
//! │  │    Product    │   │     Sale      │   │   RepairCharge    │     │
//! │  │ ───────────── │   │ ───────────── │   │ ───────────────── │     │
//! │  │ id (UUID)     │   │ id (UUID)     │   │ id (UUID)         │     │
//! │  │ unit_price    │   │ total_cents   │   │ estimate_cents?   │     │
//! │  │ stock_on_hand │   │ deposit_cents │   │ deposit_cents     │     │
//! │  │ reorder_…     │   │ change_cents  │   │ balance_cents     │     │
//! │  └───────────────┘   └───────┬───────┘   └───────────────────┘     │
//! │                              │ 1..n                                │
//! │                      ┌───────┴───────┐                             │
//! │                      │   SaleLine    │  snapshots name + price     │
//! │                      └───────────────┘  at sale time               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The Product owns present-tense stock; a SaleLine owns a point-in-time
//! snapshot. Historical receipts never recompute from the live catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the shop catalog.
///
/// `stock_on_hand` is owned exclusively by the Product Ledger: the only
/// code path that decrements it is the ledger's guarded stock adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Optional shop code / barcode, unique when present.
    pub code: Option<String>,

    /// Display name shown on the receipt.
    pub name: String,

    /// Optional description.
    pub description: Option<String>,

    /// Sale price in cents. Always positive.
    pub unit_price_cents: i64,

    /// Units currently in stock. Never negative after a committed operation.
    pub stock_on_hand: i64,

    /// Stock level at or below which a restocking alert is raised.
    pub reorder_threshold: i64,

    /// Whether the product is sellable (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Whether current stock is at or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_on_hand <= self.reorder_threshold
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
///
/// Change is only ever computed for cash; card and transfer amounts are
/// assumed exact by the terminal/bank.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
}

impl PaymentMethod {
    /// Whether this method produces change for overtendering.
    #[inline]
    pub const fn gives_change(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

// =============================================================================
// Sale Request (input, ephemeral)
// =============================================================================

/// One requested line of a point-of-sale transaction.
///
/// This is the single typed input shape for sale lines. Whatever ad-hoc
/// shapes a request-intake adapter accepts, they collapse to this before
/// reaching the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineRequest {
    /// Product being sold.
    pub product_id: String,

    /// Units requested. Must be positive.
    pub quantity: i64,
}

/// Payment metadata accompanying a sale request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    /// How the customer pays.
    pub method: PaymentMethod,

    /// Amount the customer handed over, in cents.
    pub amount_tendered_cents: i64,

    /// Partial payment (anticipo) applied up front, in cents. Zero when the
    /// sale is paid in full.
    #[serde(default)]
    pub deposit_cents: i64,
}

impl PaymentInput {
    /// Full cash payment with no deposit.
    pub fn cash(amount_tendered_cents: i64) -> Self {
        PaymentInput {
            method: PaymentMethod::Cash,
            amount_tendered_cents,
            deposit_cents: 0,
        }
    }

    #[inline]
    pub fn amount_tendered(&self) -> Money {
        Money::from_cents(self.amount_tendered_cents)
    }

    #[inline]
    pub fn deposit(&self) -> Money {
        Money::from_cents(self.deposit_cents)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale transaction. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,

    /// Sum of line subtotals, exactly.
    pub total_cents: i64,

    pub payment_method: PaymentMethod,

    /// What the customer handed over.
    pub amount_tendered_cents: i64,

    /// Anticipo applied. Never exceeds `total_cents`.
    pub deposit_cents: i64,

    /// Change returned (cash only, otherwise zero).
    pub change_cents: i64,

    /// What the customer still owes after the deposit.
    pub balance_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A persisted line item of a sale.
/// Uses the snapshot pattern to freeze product data at sale time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub name_snapshot: String,

    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    /// Units sold.
    pub quantity: i64,

    /// quantity × unit_price_cents.
    pub subtotal_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Low-Stock Alert
// =============================================================================

/// Advisory restocking signal collected while a sale decrements stock.
///
/// Not an error: the sale that triggered it still commits. Returned with
/// the completed sale so the caller can surface it without a second query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockAlert {
    pub product_id: String,
    pub name: String,
    pub stock_on_hand: i64,
    pub reorder_threshold: i64,
}

// =============================================================================
// Completed Sale (receipt-facing result)
// =============================================================================

/// Everything the receipt renderer needs from one committed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedSale {
    pub sale: Sale,
    /// Lines in the order they were submitted.
    pub lines: Vec<SaleLine>,
    /// One alert per product whose resulting stock fell to or below its
    /// reorder threshold during this sale.
    pub low_stock_alerts: Vec<LowStockAlert>,
}

// =============================================================================
// Repair Charge (intake deposits)
// =============================================================================

/// A charge opened when a device enters the shop for repair.
///
/// The deposit (anticipo) is often collected before the technician has
/// quoted the work, so `estimate_cents` is `None` until the estimate
/// exists; `balance_cents` stays zero until then.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RepairCharge {
    pub id: String,

    /// Free-text reference to the client record (registry is external).
    pub client_ref: Option<String>,

    /// Free-text reference to the device in repair.
    pub device_ref: Option<String>,

    /// Quoted repair total, once known.
    pub estimate_cents: Option<i64>,

    /// Anticipo collected at intake.
    pub deposit_cents: i64,

    /// max(0, estimate − deposit) once the estimate exists, else zero.
    pub balance_cents: i64,

    pub payment_method: PaymentMethod,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for opening a repair charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepairCharge {
    pub client_ref: Option<String>,
    pub device_ref: Option<String>,
    /// Present when the repair was quoted at intake.
    pub estimate_cents: Option<i64>,
    pub deposit_cents: i64,
    pub payment_method: PaymentMethod,
}

// =============================================================================
// Unit Tests
// =============================================================================
