//! # Repository Module
//!
//! Data access implementations, one repository per aggregate:
//!
//! - [`product`] - the Product Ledger (catalog + the only stock writes)
//! - [`sale`] - durable sales and their snapshot line items
//! - [`charge`] - repair-intake charges (anticipos)
//!
//! Write operations that must be atomic with the rest of a checkout expose
//! `*_on(conn, ...)` variants taking a caller-supplied connection, used by
//! `crate::checkout` inside its transaction.

pub mod charge;
pub mod product;
pub mod sale;

pub use charge::ChargeRepository;
pub use product::{ProductRepository, StockDecrement};
pub use sale::SaleRepository;
