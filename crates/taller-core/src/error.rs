//! # Error Types
//!
//! Domain-specific error types for taller-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           Error Types                               │
//! │                                                                     │
//! │  taller-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule rejections                    │
//! │  └── ValidationError  - Input shape failures                        │
//! │                                                                     │
//! │  taller-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                 │
//! │  └── EngineError      - Rejected(CoreError) | Db(DbError)           │
//! │                                                                     │
//! │  Every CoreError is a caller error: the request can be corrected    │
//! │  and re-submitted. None of them leaves partially-applied state.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derive macros, never manual impls
//! 2. Include context in error messages (product id, amounts)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule rejections surfaced synchronously to the requester.
///
/// The engine never retries these itself; retry (e.g. re-submit after
/// restock) is the caller's decision.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced product does not exist (or is inactive).
    ///
    /// Aborts the whole batch: nothing is decremented for any line,
    /// including lines that validated earlier.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A sale request carried no lines.
    #[error("Sale has no lines")]
    EmptySale,

    /// A line requested a non-positive or out-of-range quantity.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// The anticipo exceeds what is owed.
    ///
    /// Checked once the total is known, before any stock mutation.
    #[error("Deposit {deposit_cents} exceeds total {total_cents}")]
    InvalidDeposit { deposit_cents: i64, total_cents: i64 },

    /// Not enough stock to satisfy a line.
    ///
    /// Detected during mutation; the engine rolls the whole batch back
    /// before returning this, so the caller observes no application at all.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// A repair estimate below the deposit already collected.
    #[error("Estimate {estimate_cents} is below the deposit already collected ({deposit_cents})")]
    InvalidEstimate {
        estimate_cents: i64,
        deposit_cents: i64,
    },

    /// Input shape failure (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input shape errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g. invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
