//! # taller-db: Database Layer for the Taller Sales Engine
//!
//! This crate provides database access for the repair-shop sales engine.
//! It uses SQLite for local storage with sqlx for async operations, and
//! hosts the checkout orchestrator so that one sale maps onto exactly one
//! database transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taller Engine Data Flow                          │
//! │                                                                         │
//! │  Caller (process_sale, apply_restock, ...)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     taller-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │   Checkout   │   │   │
//! │  │   │   (pool.rs)   │    │ (product.rs)  │    │ (checkout.rs)│   │   │
//! │  │   │               │    │               │    │              │   │   │
//! │  │   │ SqlitePool    │    │ ProductRepo   │    │ one sale =   │   │   │
//! │  │   │ Migrations    │◄───│ SaleRepo      │◄───│ one          │   │   │
//! │  │   │ Management    │    │ ChargeRepo    │    │ transaction  │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            SQLite Database (WAL, foreign keys on)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`repository`] - Repository implementations (product, sale, charge)
//! - [`checkout`] - The sale orchestrator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taller_db::{Database, DbConfig};
//! use taller_core::{PaymentInput, SaleLineRequest};
//!
//! let db = Database::new(DbConfig::new("path/to/taller.db")).await?;
//!
//! let completed = db
//!     .checkout()
//!     .process_sale(
//!         &[SaleLineRequest { product_id: id, quantity: 2 }],
//!         &PaymentInput::cash(30_000),
//!     )
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::CheckoutService;
pub use error::{DbError, EngineError, EngineResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::charge::ChargeRepository;
pub use repository::product::{ProductRepository, StockDecrement};
pub use repository::sale::SaleRepository;
