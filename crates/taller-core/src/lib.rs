//! # taller-core: Pure Business Logic for Taller POS
//!
//! This crate is the heart of the sale & inventory engine. It contains all
//! business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Taller POS Architecture                        │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │               Request intake (out of scope)                   │ │
//! │  │        [SaleLineRequest] + PaymentInput  ──►  CompletedSale   │ │
//! │  └──────────────────────────────┬────────────────────────────────┘ │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐ │
//! │  │                 ★ taller-core (THIS CRATE) ★                  │ │
//! │  │                                                               │ │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐   │ │
//! │  │   │  types   │  │  money   │  │ payment  │  │ validation │   │ │
//! │  │   │ Product  │  │  Money   │  │ due-now  │  │   shape    │   │ │
//! │  │   │  Sale    │  │  cents   │  │  change  │  │   checks   │   │ │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └────────────┘   │ │
//! │  │                                                               │ │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │ │
//! │  └──────────────────────────────┬────────────────────────────────┘ │
//! │                                 │                                   │
//! │  ┌──────────────────────────────▼────────────────────────────────┐ │
//! │  │                  taller-db (Database Layer)                   │ │
//! │  │      Product Ledger, Sale Orchestrator, repair charges        │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleLine, RepairCharge, ...)
//! - [`money`] - Money type with integer-cents arithmetic (no floating point!)
//! - [`payment`] - The payment calculator (due-now / change / balance)
//! - [`error`] - Domain error types
//! - [`validation`] - Request-shape validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic, same input = same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod payment;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use taller_core::Money` instead of
// `use taller_core::money::Money`.

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use payment::{compute_payment, PaymentBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted on a single sale line.
///
/// Guards against fat-finger entries (typing 1000 instead of 10) long
/// before stock is consulted.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum unit price accepted on a catalog write, in cents ($10M).
///
/// Together with [`MAX_LINE_QUANTITY`] this bounds every line subtotal
/// far inside `i64` range, so subtotal math never overflows.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;
