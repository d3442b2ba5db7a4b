//! # Payment Calculator
//!
//! Pure money math shared by the point-of-sale flow and the repair-intake
//! flow. No I/O, no shared state: both call sites feed it cents and get
//! cents back.
//!
//! ## The Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  amount_due_now   = deposit   (when a deposit is present)           │
//! │                   = total     (otherwise)                           │
//! │  balance_remaining = max(0, total − deposit)                        │
//! │  change_due        = max(0, tendered − amount_due_now)  cash only   │
//! │                    = 0                                  otherwise   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Card and transfer amounts are assumed exact by the terminal/bank, so
//! they never produce change.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::PaymentMethod;

/// Monetary summary of one payment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    /// What the customer owes at this moment: the deposit when one is
    /// being collected, the full total otherwise.
    pub amount_due_now: Money,

    /// Cash returned to the customer. Zero for card/transfer.
    pub change_due: Money,

    /// What remains owed after this payment event.
    pub balance_remaining: Money,
}

/// Computes the due-now / change / balance figures for a payment.
///
/// Pure function: the deposit-vs-total bound is the orchestrator's check,
/// not this function's, so the repair-intake flow can call it with a
/// deposit against a not-yet-known total (total = 0).
///
/// ```rust
/// use taller_core::money::Money;
/// use taller_core::payment::compute_payment;
/// use taller_core::types::PaymentMethod;
///
/// // $250.00 sale, cash, $300.00 tendered, no deposit
/// let breakdown = compute_payment(
///     Money::from_cents(25_000),
///     Money::zero(),
///     PaymentMethod::Cash,
///     Money::from_cents(30_000),
/// );
/// assert_eq!(breakdown.change_due.cents(), 5000);
/// assert_eq!(breakdown.balance_remaining.cents(), 0);
/// ```
pub fn compute_payment(
    total: Money,
    deposit: Money,
    method: PaymentMethod,
    amount_tendered: Money,
) -> PaymentBreakdown {
    let amount_due_now = if deposit.is_positive() { deposit } else { total };

    let balance_remaining = total.sub_clamped(deposit);

    let change_due = if method.gives_change() {
        amount_tendered.sub_clamped(amount_due_now)
    } else {
        Money::zero()
    };

    PaymentBreakdown {
        amount_due_now,
        change_due,
        balance_remaining,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
